/// Persistence layer: one module per entity, explicit SQL, no generic DAO.
/// Mutations take the caller's `Transaction`; reads take any executor.

pub mod posts;
pub mod users;
