//! User accounts: the indexed resource service exemplar.
//!
//! Users live in a primary bucket keyed by their encoded identifier, with a
//! secondary index bucket mapping each unique name back to that identifier.
//! Every mutation maintains both buckets inside one write transaction, so
//! at any committed point the index maps exactly one name to each existing
//! user and nothing else.

use basin_kv::{Cursor, KvError, Store, Tx};
use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, PlatformResult};
use crate::id::{Id, IdGenerator};

/// Primary bucket: encoded id -> serialized user.
pub const USER_BUCKET: &[u8] = b"usersv1";

/// Secondary index bucket: name -> encoded id.
pub const USER_INDEX_BUCKET: &[u8] = b"userindexv1";

const RESOURCE: &str = "user";

/// A platform user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Generated unique identifier.
    pub id: Id,
    /// Unique human-readable name.
    pub name: String,
}

/// Filter for user lookups.
///
/// Id and name filters route to indexed lookups; any other combination
/// triggers a full ascending scan of the primary bucket.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Match by identifier.
    pub id: Option<Id>,
    /// Match by name.
    pub name: Option<String>,
}

/// Fields to change on an existing user.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New unique name.
    pub name: Option<String>,
}

/// Pagination for list operations, applied in ascending id order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindOptions {
    /// Matching entries to skip.
    pub offset: usize,
    /// Maximum entries to return; `None` is unbounded.
    pub limit: Option<usize>,
}

/// CRUD service for user accounts over any storage engine.
pub struct UserService<S> {
    store: S,
    id_gen: Box<dyn IdGenerator>,
}

impl<S: Store> UserService<S> {
    /// Create a service over `store`, drawing identifiers from `id_gen`.
    pub fn new(store: S, id_gen: Box<dyn IdGenerator>) -> Self {
        Self { store, id_gen }
    }

    /// Idempotently create the primary and index buckets.
    ///
    /// Must be called once before any other operation.
    pub fn initialize(&self) -> PlatformResult<()> {
        self.store.update(|tx| {
            tx.create_bucket_if_not_exists(USER_BUCKET)?;
            tx.create_bucket_if_not_exists(USER_INDEX_BUCKET)?;
            Ok(())
        })
    }

    /// Create a user with a generated identifier.
    ///
    /// # Errors
    ///
    /// [`PlatformError::AlreadyExists`] if the name is taken; in that case
    /// nothing is written.
    pub fn create_user(&self, name: &str) -> PlatformResult<User> {
        let user = self.store.update(|tx| {
            if Self::name_exists(tx, name)? {
                return Err(PlatformError::AlreadyExists {
                    resource: RESOURCE,
                    name: name.to_string(),
                });
            }
            let user = User { id: self.id_gen.next_id(), name: name.to_string() };
            Self::write_user(tx, &user)?;
            Ok(user)
        })?;
        tracing::debug!(id = %user.id, name = %user.name, "created user");
        Ok(user)
    }

    /// Store a user under a caller-supplied identifier, updating the index.
    pub fn put_user(&self, user: &User) -> PlatformResult<()> {
        self.store.update(|tx| Self::write_user(tx, user))
    }

    /// Look up a user by identifier.
    pub fn find_by_id(&self, id: Id) -> PlatformResult<User> {
        self.store.view(|tx| Self::user_by_id(tx, id))
    }

    /// Look up a user by name through the secondary index.
    pub fn find_by_name(&self, name: &str) -> PlatformResult<User> {
        self.store.view(|tx| Self::user_by_name(tx, name))
    }

    /// Find the first user matching `filter`.
    ///
    /// Id and name filters are indexed lookups; anything else scans the
    /// primary bucket in ascending id order, which is O(n).
    pub fn find(&self, filter: &UserFilter) -> PlatformResult<User> {
        if let Some(id) = filter.id {
            return self.find_by_id(id);
        }
        if let Some(name) = &filter.name {
            return self.find_by_name(name);
        }

        let matches = filter_users_fn(filter);
        self.store.view(|tx| {
            let mut found = None;
            Self::for_each_user(tx, |user| {
                if matches(&user) {
                    found = Some(user);
                    return false;
                }
                true
            })?;
            found.ok_or(PlatformError::NotFound(RESOURCE))
        })
    }

    /// Find all users matching `filter`, honoring pagination.
    pub fn find_all(&self, filter: &UserFilter, opts: FindOptions) -> PlatformResult<Vec<User>> {
        if let Some(id) = filter.id {
            return Ok(vec![self.find_by_id(id)?]);
        }
        if let Some(name) = &filter.name {
            return Ok(vec![self.find_by_name(name)?]);
        }

        let matches = filter_users_fn(filter);
        self.store.view(|tx| {
            let mut users = Vec::new();
            let mut matched = 0usize;
            Self::for_each_user(tx, |user| {
                if !matches(&user) {
                    return true;
                }
                matched += 1;
                if matched <= opts.offset {
                    return true;
                }
                users.push(user);
                opts.limit.map_or(true, |limit| users.len() < limit)
            })?;
            Ok(users)
        })
    }

    /// Apply `update` to the user with identifier `id`.
    ///
    /// When the name changes, the old index entry is deleted before the new
    /// entity and index entry are written, so no committed state ever has
    /// two index entries for one user.
    ///
    /// # Errors
    ///
    /// [`PlatformError::AlreadyExists`] if the new name belongs to another
    /// user; the transaction rolls back with no effect.
    pub fn update_user(&self, id: Id, update: &UserUpdate) -> PlatformResult<User> {
        self.store.update(|tx| {
            let mut user = Self::user_by_id(tx, id)?;

            if let Some(name) = &update.name {
                if *name != user.name {
                    if Self::name_exists(tx, name)? {
                        return Err(PlatformError::AlreadyExists {
                            resource: RESOURCE,
                            name: name.clone(),
                        });
                    }
                    // The index is keyed by name, so the stale entry must
                    // be pruned before the rename lands.
                    tx.delete(USER_INDEX_BUCKET, user_index_key(&user.name))?;
                    user.name = name.clone();
                }
            }

            Self::write_user(tx, &user)?;
            Ok(user)
        })
    }

    /// Delete a user and its index entry.
    pub fn delete_user(&self, id: Id) -> PlatformResult<()> {
        self.store.update(|tx| {
            let user = Self::user_by_id(tx, id)?;
            tx.delete(USER_INDEX_BUCKET, user_index_key(&user.name))?;
            tx.delete(USER_BUCKET, &id.encode())?;
            Ok::<_, PlatformError>(())
        })?;
        tracing::debug!(%id, "deleted user");
        Ok(())
    }

    fn user_by_id<T: Tx>(tx: &T, id: Id) -> PlatformResult<User> {
        let value = match tx.get(USER_BUCKET, &id.encode()) {
            Ok(value) => value,
            Err(KvError::KeyNotFound) => return Err(PlatformError::NotFound(RESOURCE)),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&value)?)
    }

    fn user_by_name<T: Tx>(tx: &T, name: &str) -> PlatformResult<User> {
        let encoded_id = match tx.get(USER_INDEX_BUCKET, user_index_key(name)) {
            Ok(value) => value,
            Err(KvError::KeyNotFound) => return Err(PlatformError::NotFound(RESOURCE)),
            Err(err) => return Err(err.into()),
        };
        Self::user_by_id(tx, Id::decode(&encoded_id)?)
    }

    fn name_exists<T: Tx>(tx: &T, name: &str) -> PlatformResult<bool> {
        match tx.get(USER_INDEX_BUCKET, user_index_key(name)) {
            Ok(_) => Ok(true),
            Err(KvError::KeyNotFound) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Write the index entry and the primary entry for `user`.
    fn write_user<T: Tx>(tx: &mut T, user: &User) -> PlatformResult<()> {
        let value = serde_json::to_vec(user)?;
        let encoded_id = user.id.encode();
        tx.put(USER_INDEX_BUCKET, user_index_key(&user.name), &encoded_id)?;
        tx.put(USER_BUCKET, &encoded_id, &value)?;
        Ok(())
    }

    /// Walk all users in ascending id order while `f` returns `true`.
    fn for_each_user<T, F>(tx: &T, mut f: F) -> PlatformResult<()>
    where
        T: Tx,
        F: FnMut(User) -> bool,
    {
        let mut cursor = tx.cursor(USER_BUCKET)?;
        let mut entry = cursor.first();
        loop {
            let pair = match entry {
                Ok(pair) => pair,
                Err(KvError::CursorOutOfRange) => break,
                Err(err) => return Err(err.into()),
            };
            let user: User = serde_json::from_slice(&pair.value)?;
            if !f(user) {
                break;
            }
            entry = cursor.next();
        }
        Ok(())
    }
}

fn user_index_key(name: &str) -> &[u8] {
    name.as_bytes()
}

fn filter_users_fn(filter: &UserFilter) -> impl Fn(&User) -> bool + '_ {
    move |user| {
        filter.id.map_or(true, |id| user.id == id)
            && filter.name.as_deref().map_or(true, |name| user.name == name)
    }
}
