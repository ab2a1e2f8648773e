use crate::db::Db;
use crate::error::Result;
use crate::request::{HandlerRequest, Reply};
use crate::store::RecordKey;

/// `POST /plural`. Bodies are stored as given; factories are not consulted.
pub(super) fn create(db: &mut Db, model: &str, request: &HandlerRequest) -> Result<Reply> {
    let attrs = request.attrs(db.schema(), model)?;
    let record = db.insert(model, attrs)?;
    tracing::debug!(key = %record.key(), "created from request body");
    Ok(Reply::record(record.key()))
}

/// `PATCH|PUT /plural/:id`
pub(super) fn update(db: &mut Db, model: &str, id: &str, request: &HandlerRequest) -> Result<Reply> {
    let key = RecordKey::new(model, id);
    db.store().get(&key)?;
    let attrs = request.attrs(db.schema(), model)?;
    let record = db.update(&key, attrs)?;
    Ok(Reply::record(record.key()))
}

/// `DELETE /plural/:id`
pub(super) fn delete(db: &mut Db, model: &str, id: &str) -> Result<Reply> {
    let removed = db.delete(model, id)?;
    tracing::debug!(key = %removed.key(), "deleted");
    Ok(Reply::empty())
}
