mod model;
mod repository;

pub use model::{PortfolioBalanceDB, PositionDB, PositionFieldsChangeset};
pub use repository::PositionRepository;
