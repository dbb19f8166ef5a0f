use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Typed application state, one value per type.
///
/// Controllers reach it through their [`ControllerContext`](crate::controller::ControllerContext).
#[derive(Default, Clone)]
pub struct State {
    data: Arc<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert<T: 'static + Send + Sync>(&mut self, value: T) {
        Arc::make_mut(&mut self.data).insert(TypeId::of::<T>(), Arc::new(value));
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.data
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State").field("entries", &self.data.len()).finish()
    }
}
