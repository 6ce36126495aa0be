mod db;
mod orders;

pub use db::SqliteOrderDatabase;
