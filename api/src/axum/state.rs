use std::sync::Arc;

use ::meti::Rag;

pub struct State {
    pub rag: Rag,
}

#[allow(clippy::module_name_repetitions)]
pub type AppState = Arc<State>;

pub fn create(rag: Rag) -> AppState {
    Arc::new(State { rag })
}
