/// UI module exports

pub mod components;
pub mod dashboard;
pub mod live;
pub mod popup;
pub mod reconcile;
