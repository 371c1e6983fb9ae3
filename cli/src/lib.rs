pub mod logging;
pub mod output;
pub mod wizard;
