use crate::db::Db;
use crate::error::Result;
use crate::request::{HandlerRequest, Reply};

/// `GET /plural`, narrowed by any `filter[attr]=value` pairs.
pub(super) fn list(db: &Db, model: &str, request: &HandlerRequest) -> Result<Reply> {
    let keys = db
        .store()
        .where_eq(model, request.query.filter())?
        .into_iter()
        .map(|record| record.key())
        .collect();
    Ok(Reply::collection(keys))
}

/// `GET /plural/:id`
pub(super) fn show(db: &Db, model: &str, id: &str) -> Result<Reply> {
    let record = db.store().find(model, id)?;
    Ok(Reply::record(record.key()))
}
