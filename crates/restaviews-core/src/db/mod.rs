//! Durable local stores: the mirror of server entities and the outbox of
//! unconfirmed mutations, both in one libSQL file

mod connection;
mod migrations;
mod mirror_repository;
mod outbox_repository;

pub use connection::Database;
pub use migrations::CURRENT_VERSION;
pub use mirror_repository::{
    LibSqlMirrorRepository, MirrorRepository, MirrorTable, RestaurantTable, ReviewTable,
};
pub use outbox_repository::{LibSqlOutboxRepository, OutboxRepository};
