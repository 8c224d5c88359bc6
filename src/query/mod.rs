// Query module - executes synthesized SQL and classifies statements
pub mod executor;
pub mod parser;
pub mod result;

pub use executor::execute_on;
pub use parser::{classify, StatementKind, StatementPolicy};
pub use result::{ResultSet, Row, Value};
