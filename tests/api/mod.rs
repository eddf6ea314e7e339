mod envelope_tests;
mod pagination_tests;
mod rate_limit_tests;
mod upload_policy_tests;
mod validation_tests;
