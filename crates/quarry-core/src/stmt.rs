mod cond;
pub use cond::{Comparator, Cond};

mod join;
pub use join::{Join, JoinKind, RawJoin};

mod scope;
pub use scope::{Direction, Scope};

mod selector;
pub use selector::Selector;

mod value;
pub use value::{FromValue, Value};
