pub mod push_display;
