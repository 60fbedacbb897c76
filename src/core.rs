pub mod consumption;
pub mod history;
pub mod reading;
pub mod reconcile;
pub mod synchronizer;
pub mod window;
