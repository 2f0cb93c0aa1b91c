use std::sync::Arc;

use axum::extract::FromRef;
use bannerboard_core::{Board, Config, SqliteDatabase};

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub board: Arc<Board<SqliteDatabase>>,
    pub config: Arc<Config>,
}

impl ServerContext {
    pub fn new(board: Board<SqliteDatabase>, config: Config) -> Self {
        Self {
            board: Arc::new(board),
            config: Arc::new(config),
        }
    }
}
