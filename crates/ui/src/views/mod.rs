mod history;
mod patrol;
mod state;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use history::HistoryView;
pub use patrol::PatrolView;
pub use state::{ViewError, ViewState, view_state_from_resource};
