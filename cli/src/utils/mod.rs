pub mod date_target;
