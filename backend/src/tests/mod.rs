mod common;

mod auth_session_test;
mod one_time_token_test;
