//! CRUD shorthand handlers.
//!
//! Each shorthand is bound to a model at registration. The record id, when
//! there is one, comes from the route's trailing `:param`.

mod read;
mod write;

use crate::db::Db;
use crate::error::{MockError, Result};
use crate::request::{HandlerRequest, Reply};
use crate::routes::{CrudKind, RouteBinding};

/// Run a shorthand against the database.
pub fn run(kind: CrudKind, model: &str, route: &RouteBinding, db: &mut Db, request: &HandlerRequest) -> Result<Reply> {
    match kind {
        CrudKind::List => read::list(db, model, request),
        CrudKind::Show => read::show(db, model, record_id(route, request)?),
        CrudKind::Create => write::create(db, model, request),
        CrudKind::Update => write::update(db, model, record_id(route, request)?, request),
        CrudKind::Delete => write::delete(db, model, record_id(route, request)?),
    }
}

fn record_id<'r>(route: &RouteBinding, request: &'r HandlerRequest) -> Result<&'r str> {
    route
        .pattern
        .trailing_param()
        .and_then(|name| request.param(name))
        .ok_or_else(|| MockError::InvalidRoute(format!("{} has no id segment", route.pattern)))
}
