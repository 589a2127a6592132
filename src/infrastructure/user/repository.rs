//! Storage-backed user repository
//!
//! Keeps three tables in step: the primary `users` table keyed by ID and two
//! lookup indexes keyed by phone number and email. The backing stores offer
//! no multi-row transactions, so uniqueness rests on `Storage::create` being
//! insert-if-absent: whoever inserts an index key first owns it. Rows written
//! before a failed step are removed again on a best-effort basis.
//!
//! An index entry whose owner is gone, or whose owner moved to another
//! contact after the entry was written, is a leftover. Lookups and existence
//! checks ignore leftovers and the next claim of that key takes it over.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::domain::storage::{Storage, StorageEntity};
use crate::domain::user::{
    normalize_page_size, EmailIndexEntry, IndexKey, PhoneIndexEntry, User, UserId, UserPage,
    UserRepository,
};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_repository_operation;
use crate::infrastructure::storage::StorageFactory;

pub const USERS_TABLE: &str = "users";
pub const PHONE_INDEX_TABLE: &str = "users_by_phone";
pub const EMAIL_INDEX_TABLE: &str = "users_by_email";

/// A row of one of the lookup indexes
trait IndexEntry: StorageEntity<Key = IndexKey> + PartialEq + 'static {
    /// Human-readable name used in log fields and messages
    const FIELD: &'static str;

    fn for_user(value: &str, user_id: UserId) -> Self;

    fn owner(&self) -> &UserId;

    fn written_at(&self) -> DateTime<Utc>;

    /// The user's current value for this index
    fn contact(user: &User) -> &str;

    fn already_exists(value: &str) -> DomainError;
}

impl IndexEntry for PhoneIndexEntry {
    const FIELD: &'static str = "phone number";

    fn for_user(value: &str, user_id: UserId) -> Self {
        PhoneIndexEntry::new(value, user_id)
    }

    fn owner(&self) -> &UserId {
        &self.user_id
    }

    fn written_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn contact(user: &User) -> &str {
        user.phone_number()
    }

    fn already_exists(value: &str) -> DomainError {
        DomainError::phone_already_exists(value)
    }
}

impl IndexEntry for EmailIndexEntry {
    const FIELD: &'static str = "email";

    fn for_user(value: &str, user_id: UserId) -> Self {
        EmailIndexEntry::new(value, user_id)
    }

    fn owner(&self) -> &UserId {
        &self.user_id
    }

    fn written_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn contact(user: &User) -> &str {
        user.email()
    }

    fn already_exists(value: &str) -> DomainError {
        DomainError::email_already_exists(value)
    }
}

/// Storage-backed implementation of UserRepository
#[derive(Debug, Clone)]
pub struct StorageUserRepository {
    users: Arc<dyn Storage<User>>,
    phones: Arc<dyn Storage<PhoneIndexEntry>>,
    emails: Arc<dyn Storage<EmailIndexEntry>>,
}

impl StorageUserRepository {
    pub fn new(
        users: Arc<dyn Storage<User>>,
        phones: Arc<dyn Storage<PhoneIndexEntry>>,
        emails: Arc<dyn Storage<EmailIndexEntry>>,
    ) -> Self {
        Self {
            users,
            phones,
            emails,
        }
    }

    /// Open (and on PostgreSQL, create) the three tables through a factory
    pub async fn from_factory(factory: &StorageFactory) -> Result<Self, DomainError> {
        Ok(Self::new(
            factory.create::<User>(USERS_TABLE).await?,
            factory.create::<PhoneIndexEntry>(PHONE_INDEX_TABLE).await?,
            factory.create::<EmailIndexEntry>(EMAIL_INDEX_TABLE).await?,
        ))
    }

    /// Repository over fresh in-memory tables
    pub fn in_memory() -> Self {
        Self::new(
            StorageFactory::create_in_memory::<User>(USERS_TABLE),
            StorageFactory::create_in_memory::<PhoneIndexEntry>(PHONE_INDEX_TABLE),
            StorageFactory::create_in_memory::<EmailIndexEntry>(EMAIL_INDEX_TABLE),
        )
    }

    async fn create_inner(&self, user: &User) -> Result<(), DomainError> {
        let id = user.id();

        if self.check_phone_exists(user.phone_number()).await? {
            return Err(DomainError::phone_already_exists(user.phone_number()));
        }

        if self.check_email_exists(user.email()).await? {
            return Err(DomainError::email_already_exists(user.email()));
        }

        self.users.create(user.clone()).await.map_err(|e| {
            if e.is_conflict() {
                DomainError::conflict(format!("User '{}' already exists", id))
            } else {
                e
            }
        })?;

        // The pre-checks above can race another create; the conditional
        // index inserts decide the winner.
        if let Err(e) = self.claim(self.phones.as_ref(), user.phone_number(), id).await {
            self.discard_record(id).await;
            return Err(e);
        }

        if let Err(e) = self.claim(self.emails.as_ref(), user.email(), id).await {
            self.release_claims(user, true, false).await;
            self.discard_record(id).await;
            return Err(e);
        }

        Ok(())
    }

    /// Persist `user`, moving whichever index keys changed.
    ///
    /// New keys are claimed before the record is written and old keys are
    /// released after it, so the user resolves through the old contacts
    /// until the write and through the new ones from then on.
    async fn update_inner(&self, user: &User) -> Result<(), DomainError> {
        let id = user.id();
        let existing = self.get_by_id(id).await?;

        let phone_changed = existing.phone_number() != user.phone_number();
        let email_changed = existing.email() != user.email();

        if phone_changed {
            self.ensure_available(self.phones.as_ref(), user.phone_number(), id)
                .await?;
        }

        if email_changed {
            self.ensure_available(self.emails.as_ref(), user.email(), id)
                .await?;
        }

        if phone_changed {
            self.claim(self.phones.as_ref(), user.phone_number(), id)
                .await?;
        }

        if email_changed {
            if let Err(e) = self.claim(self.emails.as_ref(), user.email(), id).await {
                self.release_claims(user, phone_changed, false).await;
                return Err(e);
            }
        }

        // Fails with NotFound when a concurrent delete removed the row, so a
        // deleted user never reappears.
        if let Err(e) = self.users.update(user.clone()).await {
            self.release_claims(user, phone_changed, email_changed).await;
            return Err(e);
        }

        if phone_changed {
            compensate(
                "release_old_phone",
                release(self.phones.as_ref(), existing.phone_number(), id).await,
            );
        }

        if email_changed {
            compensate(
                "release_old_email",
                release(self.emails.as_ref(), existing.email(), id).await,
            );
        }

        Ok(())
    }

    async fn delete_inner(&self, id: &UserId) -> Result<(), DomainError> {
        let user = self.get_by_id(id).await?;

        release(self.phones.as_ref(), user.phone_number(), id).await?;
        release(self.emails.as_ref(), user.email(), id).await?;

        if !self.users.delete(id).await? {
            return Err(DomainError::user_not_found(id));
        }

        Ok(())
    }

    async fn list_inner(&self, limit: i64, page_token: &str) -> Result<UserPage, DomainError> {
        let limit = normalize_page_size(limit);

        let after = if page_token.is_empty() {
            None
        } else {
            Some(UserId::parse(page_token).map_err(|_| {
                DomainError::invalid_argument(format!("Invalid page token '{}'", page_token))
            })?)
        };

        let users = self
            .users
            .list_page(limit, after.as_ref().map(|id| id.as_str()))
            .await?;

        let next_page_token = if users.len() == limit {
            users
                .last()
                .map(|user| user.id().to_string())
                .unwrap_or_default()
        } else {
            String::new()
        };

        Ok(UserPage {
            users,
            next_page_token,
        })
    }

    /// Resolve an index key to the user it points at.
    ///
    /// Dangling entries, and entries left behind for a contact the user no
    /// longer has, resolve to `NotFound`.
    async fn resolve<E: IndexEntry>(
        &self,
        index: &dyn Storage<E>,
        value: &str,
    ) -> Result<User, DomainError> {
        let not_found =
            || DomainError::not_found(format!("User with {} '{}' not found", E::FIELD, value));

        let entry = index
            .get(&IndexKey::new(value))
            .await?
            .ok_or_else(not_found)?;

        let user = match self.users.get(entry.owner()).await? {
            Some(user) => user,
            None => {
                warn!(
                    field = E::FIELD,
                    user_id = %entry.owner(),
                    "Index entry points at a missing user"
                );
                return Err(not_found());
            }
        };

        if E::contact(&user) != value {
            warn!(field = E::FIELD, user_id = %user.id(), "Index entry is stale");
            return Err(not_found());
        }

        Ok(user)
    }

    /// The entry held for `value`, unless it is a leftover
    async fn live_entry<E: IndexEntry>(
        &self,
        index: &dyn Storage<E>,
        value: &str,
    ) -> Result<Option<E>, DomainError> {
        let Some(entry) = index.get(&IndexKey::new(value)).await? else {
            return Ok(None);
        };

        if self.is_leftover(&entry, value).await? {
            return Ok(None);
        }

        Ok(Some(entry))
    }

    /// True when the owner is gone, or its record was written after the
    /// entry with a different contact.
    ///
    /// An entry claimed by an update still in flight is newer than the
    /// owner's stored record and stays live.
    async fn is_leftover<E: IndexEntry>(
        &self,
        entry: &E,
        value: &str,
    ) -> Result<bool, DomainError> {
        Ok(match self.users.get(entry.owner()).await? {
            None => true,
            Some(owner) => {
                E::contact(&owner) != value && entry.written_at() <= owner.updated_at()
            }
        })
    }

    /// Insert an index entry for `id`, mapping a taken key to `AlreadyExists`.
    ///
    /// A key the same user already holds counts as claimed. A leftover held
    /// for someone else is evicted and the insert retried once.
    async fn claim<E: IndexEntry>(
        &self,
        index: &dyn Storage<E>,
        value: &str,
        id: &UserId,
    ) -> Result<(), DomainError> {
        let key = IndexKey::new(value);

        for _ in 0..2 {
            match index.create(E::for_user(value, id.clone())).await {
                Ok(_) => return Ok(()),
                Err(e) if !e.is_conflict() => return Err(e),
                Err(_) => {}
            }

            match index.get(&key).await? {
                Some(held) if held.owner() == id => {
                    // Re-stamp a leftover of our own so it stays live until
                    // the record write lands
                    index.update(E::for_user(value, id.clone())).await?;
                    return Ok(());
                }
                Some(held) => {
                    if !self.is_leftover(&held, value).await? {
                        return Err(E::already_exists(value));
                    }

                    warn!(
                        field = E::FIELD,
                        user_id = %id,
                        previous_owner = %held.owner(),
                        "Taking over leftover index entry"
                    );
                    evict(index, &held).await?;
                }
                None => {}
            }
        }

        Err(E::already_exists(value))
    }

    /// Fail with `AlreadyExists` when another user holds `value`
    async fn ensure_available<E: IndexEntry>(
        &self,
        index: &dyn Storage<E>,
        value: &str,
        id: &UserId,
    ) -> Result<(), DomainError> {
        match self.live_entry(index, value).await? {
            Some(entry) if entry.owner() != id => Err(E::already_exists(value)),
            _ => Ok(()),
        }
    }

    /// Give back keys this call claimed for `user`
    async fn release_claims(&self, user: &User, phone: bool, email: bool) {
        if phone {
            compensate(
                "release_phone",
                release(self.phones.as_ref(), user.phone_number(), user.id()).await,
            );
        }

        if email {
            compensate(
                "release_email",
                release(self.emails.as_ref(), user.email(), user.id()).await,
            );
        }
    }

    async fn discard_record(&self, id: &UserId) {
        compensate("discard_record", self.users.delete(id).await.map(|_| ()));
    }
}

/// Remove an index entry, but only while it still points at `id`
async fn release<E: IndexEntry>(
    index: &dyn Storage<E>,
    value: &str,
    id: &UserId,
) -> Result<(), DomainError> {
    let key = IndexKey::new(value);

    match index.get(&key).await? {
        Some(entry) if entry.owner() == id => {
            index.delete(&key).await?;
        }
        Some(entry) => {
            warn!(
                field = E::FIELD,
                user_id = %id,
                owner = %entry.owner(),
                "Index entry belongs to another user, leaving it in place"
            );
        }
        None => {
            debug!(field = E::FIELD, user_id = %id, "Index entry already absent");
        }
    }

    Ok(())
}

/// Delete `held` unless the key was rewritten since it was read
async fn evict<E: IndexEntry>(index: &dyn Storage<E>, held: &E) -> Result<(), DomainError> {
    if index.get(held.key()).await?.as_ref() == Some(held) {
        index.delete(held.key()).await?;
    }

    Ok(())
}

fn compensate(step: &'static str, result: Result<(), DomainError>) {
    if let Err(e) = result {
        warn!(step, error = %e, "Compensating write failed, tables may be inconsistent");
    }
}

fn observe<T>(operation: &'static str, result: Result<T, DomainError>) -> Result<T, DomainError> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    record_repository_operation(operation, outcome);
    result
}

#[async_trait]
impl UserRepository for StorageUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id()))]
    async fn create_user(&self, user: &User) -> Result<(), DomainError> {
        let result = observe("create_user", self.create_inner(user).await);

        if result.is_ok() {
            info!("User record created");
        }

        result
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn get_by_id(&self, id: &UserId) -> Result<User, DomainError> {
        debug!("Loading user");

        let result = match self.users.get(id).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(DomainError::user_not_found(id)),
            Err(e) => Err(e),
        };

        observe("get_by_id", result)
    }

    #[instrument(skip(self))]
    async fn get_by_phone(&self, phone: &str) -> Result<User, DomainError> {
        let result = self.resolve(self.phones.as_ref(), phone).await;

        observe("get_by_phone", result)
    }

    #[instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> Result<User, DomainError> {
        let result = self.resolve(self.emails.as_ref(), email).await;

        observe("get_by_email", result)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id()))]
    async fn update_user(&self, user: &User) -> Result<(), DomainError> {
        let result = observe("update_user", self.update_inner(user).await);

        if result.is_ok() {
            info!("User record updated");
        }

        result
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn delete_user(&self, id: &UserId) -> Result<(), DomainError> {
        let result = observe("delete_user", self.delete_inner(id).await);

        if result.is_ok() {
            info!("User record deleted");
        }

        result
    }

    #[instrument(skip(self))]
    async fn list_users(&self, limit: i64, page_token: &str) -> Result<UserPage, DomainError> {
        observe("list_users", self.list_inner(limit, page_token).await)
    }

    async fn check_email_exists(&self, email: &str) -> Result<bool, DomainError> {
        let result = self.live_entry(self.emails.as_ref(), email).await;

        observe("check_email_exists", result.map(|entry| entry.is_some()))
    }

    async fn check_phone_exists(&self, phone: &str) -> Result<bool, DomainError> {
        let result = self.live_entry(self.phones.as_ref(), phone).await;

        observe("check_phone_exists", result.map(|entry| entry.is_some()))
    }
}
