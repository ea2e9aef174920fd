//! Pushing local edits and resolving concurrency-stamp conflicts.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use tidesync_api::{
    partial_update, ApiResponse, Envelope, ResponseChain, ERROR_STALE_STAMP_PREFIX,
    JSON_ATTR_UPDATED_IN_DB_AT,
};
use tidesync_api::ApiErrorDetail;
use tidesync_engine::{
    EngineResult, Reconciler, SyncArgs, SyncDispatcher, SyncHandler, SyncScope,
};
use tidesync_model::clear_changed_matching;
use tidesync_store::{LocalStore, MemoryStore};
use tidesync_testkit::{Contact, PagedApi, CONTACT_TYPE};

const HANDLER_TYPE: &str = "contacts";

/// Pushes dirty contacts. Scripted transports: `updates` answers the write,
/// `reads` answers the forced resync triggered by a stamp conflict.
struct ContactPushHandler {
    store: Arc<dyn LocalStore>,
    updates: Arc<PagedApi<Contact>>,
    reads: Arc<PagedApi<Contact>>,
}

impl ContactPushHandler {
    async fn push_dirty(&self) -> EngineResult<()> {
        for entity in self.store.dirty(CONTACT_TYPE)? {
            let Some(contact) = entity.as_any().downcast_ref::<Contact>() else {
                continue;
            };
            if contact.change.has_changed_fields()
                && !contact.change.is_new
                && !contact.change.is_deleted
            {
                self.push_changed(contact).await?;
            }
        }
        Ok(())
    }

    async fn push_changed(&self, contact: &Contact) -> EngineResult<()> {
        let Some(id) = contact.id.clone() else {
            return Ok(());
        };
        // only the changed fields plus the stamp go over the wire
        let payload = partial_update(contact);
        assert!(payload
            .data
            .attributes
            .contains_key(JSON_ATTR_UPDATED_IN_DB_AT));

        let mut confirmed: Option<Contact> = None;
        let mut stamp_conflict = false;
        self.updates
            .fetch(1)
            .on_success(|body| confirmed = body.single().cloned())
            .on_error(|response| {
                if response
                    .api_errors()
                    .iter()
                    .any(ApiErrorDetail::is_stale_stamp)
                {
                    stamp_conflict = true;
                    return true;
                }
                false
            });

        if let Some(fresh) = confirmed {
            self.store.transaction(&mut |txn| {
                // drop the markers the server just accepted, then store its copy
                if let Some(mut persisted) = txn.get(CONTACT_TYPE, &id)? {
                    clear_changed_matching(&mut *persisted, contact);
                    txn.upsert(persisted)?;
                }
                Reconciler::new().save_one(txn, Box::new(fresh.clone()))?;
                Ok(())
            })?;
        }

        if stamp_conflict {
            // the write is unrecoverable as-is; refetch this one resource
            self.resync_contact().await?;
        }
        Ok(())
    }

    async fn resync_contact(&self) -> EngineResult<()> {
        let mut fresh: Option<Contact> = None;
        self.reads
            .fetch(1)
            .on_success(|body| fresh = body.single().cloned())
            .on_error(|_| true);

        if let Some(contact) = fresh {
            self.store.transaction(&mut |txn| {
                Reconciler::new().save_one(txn, Box::new(contact.clone()))?;
                Ok(())
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl SyncHandler for ContactPushHandler {
    fn store(&self) -> &Arc<dyn LocalStore> {
        &self.store
    }

    async fn sync(&self, args: &SyncArgs) -> EngineResult<()> {
        match args.scope() {
            SyncScope::Dirty => self.push_dirty().await,
            _ => Ok(()),
        }
    }
}

fn dirty_contact() -> Contact {
    let mut contact = Contact {
        id: Some("c1".into()),
        account_id: Some("a1".into()),
        name: Some("Ada".into()),
        amount: Some(10.0),
        updated_in_db_at: Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap()),
        ..Contact::default()
    };
    contact.change.set_tracking(true);
    contact.set_amount(Some(50.0));
    contact.change.set_tracking(false);
    contact
}

fn setup() -> (
    Arc<MemoryStore>,
    Arc<PagedApi<Contact>>,
    Arc<PagedApi<Contact>>,
    Arc<SyncDispatcher>,
) {
    let store = Arc::new(MemoryStore::new());
    store
        .transaction(&mut |txn| txn.upsert(Box::new(dirty_contact())))
        .unwrap();

    let updates = Arc::new(PagedApi::new());
    let reads = Arc::new(PagedApi::new());
    let dispatcher = SyncDispatcher::new(store.clone() as Arc<dyn LocalStore>);
    let handler = Arc::new(ContactPushHandler {
        store: store.clone() as Arc<dyn LocalStore>,
        updates: Arc::clone(&updates),
        reads: Arc::clone(&reads),
    });
    dispatcher.register_handler(HANDLER_TYPE, handler).unwrap();
    (store, updates, reads, dispatcher)
}

fn dirty_args() -> SyncArgs {
    SyncArgs::new(HANDLER_TYPE, SyncScope::Dirty)
}

#[tokio::test]
async fn confirmed_push_clears_change_markers() {
    let (store, updates, _reads, dispatcher) = setup();

    // the server echoes the accepted write with a new stamp
    let mut echoed = dirty_contact();
    echoed.change = Default::default();
    echoed.updated_in_db_at = Some(Utc.timestamp_opt(1_700_000_100, 0).unwrap());
    updates.set_page(1, ApiResponse::success(200, Envelope::of(vec![echoed])));

    dispatcher.submit(dirty_args()).run().await.unwrap();

    let persisted = store.get(CONTACT_TYPE, "c1").unwrap().unwrap();
    assert!(!persisted.change_state().has_changed_fields());
    assert_eq!(persisted.attribute("amount"), Some(json!(50.0)));
    assert!(store.dirty(CONTACT_TYPE).unwrap().is_empty());
}

#[tokio::test]
async fn stamp_conflict_triggers_forced_resync() {
    let (store, updates, reads, dispatcher) = setup();

    updates.set_page(
        1,
        ApiResponse::error(
            409,
            json!({
                "errors": [{
                    "code": "409",
                    "detail": format!("{} (2024-03-01T00:00:00Z)", ERROR_STALE_STAMP_PREFIX)
                }]
            })
            .to_string(),
        ),
    );

    // the authoritative copy fetched by the conflict resync
    let server_copy = Contact {
        id: Some("c1".into()),
        account_id: Some("a1".into()),
        name: Some("Ada Lovelace".into()),
        amount: Some(10.0),
        updated_in_db_at: Some(Utc.timestamp_opt(1_700_000_200, 0).unwrap()),
        ..Contact::default()
    };
    reads.set_page(1, ApiResponse::success(200, Envelope::of(vec![server_copy])));

    dispatcher.submit(dirty_args()).run().await.unwrap();
    assert_eq!(reads.calls(), 1);

    let persisted = store.get(CONTACT_TYPE, "c1").unwrap().unwrap();
    let persisted = persisted.as_any().downcast_ref::<Contact>().unwrap();
    // the resync adopted the server's stamp and fields, but the unpushed
    // local edit still shadows the server value and stays marked for retry
    assert_eq!(
        persisted.updated_in_db_at,
        Some(Utc.timestamp_opt(1_700_000_200, 0).unwrap())
    );
    assert_eq!(persisted.name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(persisted.amount, Some(50.0));
    assert!(persisted.change.has_changed_fields());
}

#[tokio::test]
async fn unrelated_errors_do_not_resync() {
    let (_store, updates, reads, dispatcher) = setup();
    updates.set_page(
        1,
        ApiResponse::error(
            400,
            json!({"errors": [{"code": "400", "detail": "Name can't be blank"}]}).to_string(),
        ),
    );

    dispatcher.submit(dirty_args()).run().await.unwrap();
    assert_eq!(reads.calls(), 0);
}
