//! Method dispatcher
//!
//! Executes an approved request against the directory store and produces
//! the structured response. No other side effects; store I/O failures
//! propagate to the connection handler instead of being swallowed here.

use crate::errors::Error;
use crate::protocol::{Request, Response};
use crate::storage::DirectoryStore;

/// Execute `request` against `store`.
pub async fn dispatch(request: &Request, store: &DirectoryStore) -> Result<Response, Error> {
    match request {
        Request::Get { name } => Ok(match store.lookup(name).await? {
            Some(phones) => Response::Ok(phones),
            None => Response::NotFound,
        }),
        Request::Delete { name } => Ok(if store.remove(name).await? {
            Response::Ok(vec![])
        } else {
            Response::NotFound
        }),
        Request::Write { name, phones } => {
            store.upsert(name, phones.clone()).await?;
            Ok(Response::Ok(vec![]))
        }
    }
}
