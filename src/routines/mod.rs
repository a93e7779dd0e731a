// Routines for logging
pub mod logger;
// Routines for output
pub mod output;
// Routines for settings
pub mod settings;
// Routines for descriptive statistics
pub mod summary;
