use crate::use_cases::ArenaHandle;

#[derive(Clone)]
pub struct AppState {
    // The single running arena every connection joins.
    pub arena: ArenaHandle,
}
