pub mod db_utils;
pub mod email_cache;
pub mod email_filter;
pub mod settings_cache;
pub mod time_calc;
