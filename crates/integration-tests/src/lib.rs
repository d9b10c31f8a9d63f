//! In-memory fakes of the external-service contracts.
//!
//! The orchestration stores take `Arc<dyn …>` service handles, so tests
//! swap the Supabase implementations for these: a product table in a
//! `Mutex`, an identity provider with scripted accounts, and an
//! authorization lookup whose behavior (allow, deny, error, hang) is set
//! per test.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use tokio::sync::broadcast;

use varmina_core::{
    BrandSettings, CreateProductInput, ErpMetadata, ImageUpload, Price, Product, ProductId,
    ProductStatus, UpdateProductInput, UserId,
};
use varmina_storefront::services::{
    AuthChange, AuthEvent, AuthorizationService, IdentityService, ProductService, ServiceError,
    Session, SettingsService,
};

// =============================================================================
// Builders
// =============================================================================

/// A product value with sensible defaults for tests.
#[must_use]
pub fn product(id: &str, name: &str, clp: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        description: String::new(),
        price: Price::new(clp),
        images: vec![],
        status: ProductStatus::InStock,
        collection: None,
        category: None,
        badge: None,
        variants: vec![],
        stock: None,
        whatsapp_clicks: 0,
        erp: ErpMetadata::default(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// A session for the given user id.
#[must_use]
pub fn session(user_id: &str) -> Session {
    Session {
        user_id: UserId::new(user_id),
        email: Some(format!("{user_id}@varmina.cl")),
        access_token: SecretString::from("test-access-token"),
    }
}

// =============================================================================
// InMemoryProductService
// =============================================================================

/// `ProductService` over a `Mutex<Vec<Product>>`, with failure/delay
/// switches and a fetch counter for debounce assertions.
#[derive(Default)]
pub struct InMemoryProductService {
    products: Mutex<Vec<Product>>,
    next_id: AtomicUsize,
    pub fetch_count: AtomicUsize,
    fail_fetch: AtomicBool,
    fail_mutations: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
}

impl InMemoryProductService {
    #[must_use]
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: Mutex::new(products),
            ..Self::default()
        }
    }

    /// Make `get_all` fail until switched back.
    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Make every mutation fail until switched back.
    pub fn set_fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    /// Delay `get_all` responses (for timeout tests).
    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        *self.fetch_delay.lock().unwrap() = delay;
    }

    /// Number of `get_all` calls so far.
    #[must_use]
    pub fn fetches(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Direct view of the stored rows.
    #[must_use]
    pub fn rows(&self) -> Vec<Product> {
        self.products.lock().unwrap().clone()
    }

    fn check_mutations(&self) -> Result<(), ServiceError> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(ServiceError::Backend("mutation switched off".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductService for InMemoryProductService {
    async fn get_all(&self) -> Result<Vec<Product>, ServiceError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ServiceError::Backend("fetch switched off".to_owned()));
        }
        Ok(self.rows())
    }

    async fn create(&self, input: CreateProductInput) -> Result<Product, ServiceError> {
        self.check_mutations()?;
        let input = input.sanitized()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let created = Product {
            id: ProductId::new(format!("fixture-{id}")),
            name: input.name,
            description: input.description.unwrap_or_default(),
            price: input.price,
            images: input.images,
            status: input.status,
            collection: input.collection,
            category: input.category,
            badge: input.badge,
            variants: input.variants,
            stock: input.stock,
            whatsapp_clicks: 0,
            erp: ErpMetadata::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.products.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: &ProductId,
        updates: UpdateProductInput,
    ) -> Result<Product, ServiceError> {
        self.check_mutations()?;
        let updates = updates.sanitized()?;
        let mut products = self.products.lock().unwrap();
        let row = products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("product {id}")))?;

        if let Some(name) = updates.name {
            row.name = name;
        }
        if let Some(description) = updates.description {
            row.description = description;
        }
        if let Some(price) = updates.price {
            row.price = price;
        }
        if let Some(images) = updates.images {
            row.images = images;
        }
        if let Some(status) = updates.status {
            row.status = status;
        }
        if let Some(variants) = updates.variants {
            row.variants = variants;
        }
        if let Some(stock) = updates.stock {
            row.stock = Some(stock);
        }
        if updates.unit_cost.is_some() {
            row.erp.unit_cost = updates.unit_cost;
        }
        if updates.location.is_some() {
            row.erp.location = updates.location;
        }
        if updates.erp_category.is_some() {
            row.erp.erp_category = updates.erp_category;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), ServiceError> {
        self.check_mutations()?;
        self.products.lock().unwrap().retain(|p| &p.id != id);
        Ok(())
    }

    async fn delete_bulk(&self, ids: &[ProductId]) -> Result<(), ServiceError> {
        self.check_mutations()?;
        self.products
            .lock()
            .unwrap()
            .retain(|p| !ids.contains(&p.id));
        Ok(())
    }

    async fn update_status_bulk(
        &self,
        ids: &[ProductId],
        status: ProductStatus,
    ) -> Result<(), ServiceError> {
        self.check_mutations()?;
        let mut products = self.products.lock().unwrap();
        for row in products.iter_mut().filter(|p| ids.contains(&p.id)) {
            row.status = status;
        }
        Ok(())
    }

    async fn upload_image(&self, upload: ImageUpload) -> Result<String, ServiceError> {
        self.check_mutations()?;
        upload.validate()?;
        Ok(format!("https://fixtures.varmina.cl/{}", upload.file_name))
    }

    async fn delete_image(&self, _url: &str) -> Result<(), ServiceError> {
        self.check_mutations()
    }

    async fn update_stock(
        &self,
        id: &ProductId,
        delta: i32,
        variant_name: Option<&str>,
    ) -> Result<(), ServiceError> {
        self.check_mutations()?;
        let mut products = self.products.lock().unwrap();
        let row = products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("product {id}")))?;

        let apply = |current: Option<u32>| {
            u32::try_from((i64::from(current.unwrap_or(0)) + i64::from(delta)).max(0))
                .unwrap_or(u32::MAX)
        };
        match variant_name {
            Some(name) => {
                let variant = row
                    .variants
                    .iter_mut()
                    .find(|v| v.name == name)
                    .ok_or_else(|| ServiceError::NotFound(format!("variant {name}")))?;
                variant.stock = Some(apply(variant.stock));
            }
            None => row.stock = Some(apply(row.stock)),
        }
        Ok(())
    }

    async fn increment_whatsapp_clicks(&self, id: &ProductId) -> Result<(), ServiceError> {
        self.check_mutations()?;
        let mut products = self.products.lock().unwrap();
        if let Some(row) = products.iter_mut().find(|p| &p.id == id) {
            row.whatsapp_clicks += 1;
        }
        Ok(())
    }
}

// =============================================================================
// InMemorySettingsService
// =============================================================================

/// `SettingsService` returning a scripted value.
#[derive(Default)]
pub struct InMemorySettingsService {
    settings: Mutex<Option<BrandSettings>>,
    fail: AtomicBool,
}

impl InMemorySettingsService {
    #[must_use]
    pub fn with_settings(settings: BrandSettings) -> Self {
        Self {
            settings: Mutex::new(Some(settings)),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_settings(&self, settings: Option<BrandSettings>) {
        *self.settings.lock().unwrap() = settings;
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SettingsService for InMemorySettingsService {
    async fn get_settings(&self) -> Result<Option<BrandSettings>, ServiceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::Backend("settings switched off".to_owned()));
        }
        Ok(self.settings.lock().unwrap().clone())
    }
}

// =============================================================================
// StubIdentity
// =============================================================================

/// `IdentityService` with scripted accounts and a drivable event channel.
pub struct StubIdentity {
    accounts: Mutex<HashMap<String, (String, Session)>>,
    current: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthChange>,
    fail_sign_out: AtomicBool,
    pub session_lookups: AtomicUsize,
}

impl Default for StubIdentity {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            events,
            fail_sign_out: AtomicBool::new(false),
            session_lookups: AtomicUsize::new(0),
        }
    }
}

impl StubIdentity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account the stub will accept.
    pub fn add_account(&self, email: &str, password: &str, user_id: &str) {
        self.accounts.lock().unwrap().insert(
            email.to_owned(),
            (password.to_owned(), session(user_id)),
        );
    }

    /// Pretend a session already exists (restored at startup).
    pub fn set_current(&self, session: Option<Session>) {
        *self.current.lock().unwrap() = session;
    }

    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    /// Drive the auth-event channel directly (token refresh etc.).
    pub fn emit(&self, event: AuthEvent, session: Option<Session>) {
        let _ = self.events.send((event, session));
    }
}

#[async_trait]
impl IdentityService for StubIdentity {
    async fn current_session(&self) -> Result<Option<Session>, ServiceError> {
        self.session_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.current.lock().unwrap().clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ServiceError> {
        let accounts = self.accounts.lock().unwrap();
        let (expected, session) = accounts
            .get(email)
            .ok_or(ServiceError::InvalidCredentials)?;
        if expected != password {
            return Err(ServiceError::InvalidCredentials);
        }
        let session = session.clone();
        drop(accounts);

        *self.current.lock().unwrap() = Some(session.clone());
        self.emit(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ServiceError> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(ServiceError::Backend("sign-out switched off".to_owned()));
        }
        *self.current.lock().unwrap() = None;
        self.emit(AuthEvent::SignedOut, None);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }
}

// =============================================================================
// StubAuthz
// =============================================================================

/// How the authorization stub behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthzBehavior {
    /// Answer from the admin set.
    #[default]
    Normal,
    /// Fail every lookup.
    Error,
    /// Never answer (exercises the timeout race).
    Hang,
}

/// `AuthorizationService` with a scripted admin set and failure modes.
#[derive(Default)]
pub struct StubAuthz {
    admins: Mutex<HashSet<UserId>>,
    behavior: Mutex<AuthzBehavior>,
    pub lookups: AtomicUsize,
}

impl StubAuthz {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant the admin role to a user id.
    pub fn grant(&self, user_id: &str) {
        self.admins.lock().unwrap().insert(UserId::new(user_id));
    }

    pub fn set_behavior(&self, behavior: AuthzBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Number of lookups so far (for verdict-cache assertions).
    #[must_use]
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationService for StubAuthz {
    async fn is_admin(&self, user_id: &UserId) -> Result<bool, ServiceError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.behavior.lock().unwrap();
        match behavior {
            AuthzBehavior::Normal => Ok(self.admins.lock().unwrap().contains(user_id)),
            AuthzBehavior::Error => Err(ServiceError::Backend("role lookup switched off".to_owned())),
            AuthzBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(false)
            }
        }
    }
}
