//! In-memory [`ObjectStore`] mimicking the API server semantics the
//! reconciler relies on: create fails on existing objects, update requires
//! an existing object and a current resource version, every write bumps the
//! resource version, and uids are assigned on first write.

use std::{collections::BTreeMap, fmt, sync::Mutex};

use serde_json::Value;
use snafu::{OptionExt, ResultExt, Snafu};

use super::{ObjectStore, StoreObject};

/// Kind and namespaced name of a stored object.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct ObjectId {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ObjectId {
    pub fn new<K>(namespace: &str, name: &str) -> Self
    where
        K: StoreObject,
    {
        Self {
            kind: K::kind(&()).to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    fn of<K>(object: &K) -> Result<Self, Error>
    where
        K: StoreObject,
    {
        let meta = object.meta();
        let namespace =
            meta.namespace.as_deref().context(MissingMetadataSnafu { field: "namespace" })?;
        let name = meta.name.as_deref().context(MissingMetadataSnafu { field: "name" })?;
        Ok(Self::new::<K>(namespace, name))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

/// Store operation a failure can be injected into.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    Get,
    Create,
    Update,
}

/// A successful write, in the order the store received it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Mutation {
    Created(ObjectId),
    Updated(ObjectId),
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{id} already exists"))]
    AlreadyExists { id: ObjectId },

    #[snafu(display("{id} not found"))]
    NotFound { id: ObjectId },

    #[snafu(display("{id} has been modified since resource version {expected}"))]
    Conflict { id: ObjectId, expected: String },

    #[snafu(display("Injected {operation:?} failure on {id}"))]
    Injected { operation: Operation, id: ObjectId },

    #[snafu(display("Object has no {field} in its metadata"))]
    MissingMetadata { field: &'static str },

    #[snafu(display("Failed to convert object, error: {source}"))]
    Convert { source: serde_json::Error },
}

#[derive(Default)]
struct Inner {
    objects: BTreeMap<ObjectId, Value>,
    mutations: Vec<Mutation>,
    failures: Vec<(Operation, String)>,
    version: u64,
    uids: u64,
}

impl Inner {
    fn check(&self, operation: Operation, id: &ObjectId) -> Result<(), Error> {
        if self.failures.iter().any(|(op, kind)| *op == operation && *kind == id.kind) {
            InjectedSnafu { operation, id: id.clone() }.fail()
        } else {
            Ok(())
        }
    }

    fn load<K>(&self, id: &ObjectId) -> Result<Option<K>, Error>
    where
        K: StoreObject,
    {
        self.objects
            .get(id)
            .map(|value| serde_json::from_value(value.clone()).context(ConvertSnafu))
            .transpose()
    }

    fn persist<K>(&mut self, id: ObjectId, mut object: K) -> Result<K, Error>
    where
        K: StoreObject,
    {
        self.version += 1;
        let meta = object.meta_mut();
        meta.resource_version = Some(self.version.to_string());
        if meta.uid.is_none() {
            self.uids += 1;
            meta.uid = Some(format!("00000000-0000-0000-0000-{:012}", self.uids));
        }
        let value = serde_json::to_value(&object).context(ConvertSnafu)?;
        let _previous = self.objects.insert(id, value);
        Ok(object)
    }
}

/// [`ObjectStore`] keeping objects in memory for tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Stores `object` as if another actor had written it. Seeding is not
    /// recorded as a mutation.
    pub fn seed<K>(&self, object: K) -> K
    where
        K: StoreObject,
    {
        let id = ObjectId::of(&object).expect("seeded object must have a namespaced name");
        self.inner.lock().unwrap().persist(id, object).expect("seeded object must serialize")
    }

    /// Returns the stored object, or `None` if it does not exist.
    pub fn object<K>(&self, namespace: &str, name: &str) -> Option<K>
    where
        K: StoreObject,
    {
        self.inner.lock().unwrap().load(&ObjectId::new::<K>(namespace, name)).unwrap()
    }

    pub fn mutations(&self) -> Vec<Mutation> { self.inner.lock().unwrap().mutations.clone() }

    /// Makes every subsequent `operation` on objects of kind `K` fail.
    pub fn fail<K>(&self, operation: Operation)
    where
        K: StoreObject,
    {
        self.inner.lock().unwrap().failures.push((operation, K::kind(&()).to_string()));
    }
}

impl ObjectStore for MemoryStore {
    type Error = Error;

    async fn get<K>(&self, namespace: &str, name: &str) -> Result<Option<K>, Self::Error>
    where
        K: StoreObject,
    {
        let id = ObjectId::new::<K>(namespace, name);
        let inner = self.inner.lock().unwrap();
        inner.check(Operation::Get, &id)?;
        inner.load(&id)
    }

    async fn create<K>(&self, object: &K) -> Result<K, Self::Error>
    where
        K: StoreObject,
    {
        let id = ObjectId::of(object)?;
        let mut inner = self.inner.lock().unwrap();
        inner.check(Operation::Create, &id)?;
        if inner.objects.contains_key(&id) {
            return AlreadyExistsSnafu { id }.fail();
        }
        let created = inner.persist(id.clone(), object.clone())?;
        inner.mutations.push(Mutation::Created(id));
        Ok(created)
    }

    async fn update<K>(&self, object: &K) -> Result<K, Self::Error>
    where
        K: StoreObject,
    {
        let id = ObjectId::of(object)?;
        let mut inner = self.inner.lock().unwrap();
        inner.check(Operation::Update, &id)?;
        let stored = inner.load::<K>(&id)?.context(NotFoundSnafu { id: id.clone() })?;
        if let Some(expected) = &object.meta().resource_version
            && stored.meta().resource_version.as_ref() != Some(expected)
        {
            return ConflictSnafu { id, expected: expected.clone() }.fail();
        }
        let updated = inner.persist(id.clone(), object.clone())?;
        inner.mutations.push(Mutation::Updated(id));
        Ok(updated)
    }
}
