//! Admin dashboard view controller.
//!
//! Owns the UI state of the back office (active tab, open dialog, bulk
//! selection, inline edit target) and the mutations behind it. Writes go
//! to the product service; reads come back through the shared catalog
//! store, so a forced refresh after a bulk mutation is what makes the
//! change visible everywhere at once.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use varmina_core::{
    CreateProductInput, ErpMetadata, ImageUpload, Product, ProductId, ProductStatus,
    UpdateProductInput,
};
use varmina_storefront::catalog::CatalogStore;
use varmina_storefront::error::StoreError;
use varmina_storefront::services::ProductService;
use varmina_storefront::toast::ToastQueue;

/// Dashboard tabs. Any tab is reachable from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminTab {
    #[default]
    Inventory,
    Orders,
    Assets,
    Pricing,
    Settings,
}

/// Modal dialogs the dashboard can have open (at most one at a time).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminDialog {
    CreateProduct,
    EditProduct(ProductId),
    ConfirmDelete(ProductId),
    BulkActions,
}

/// The admin view controller.
///
/// Cheaply cloneable; all clones share the same view state.
#[derive(Clone)]
pub struct AdminController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    catalog: CatalogStore,
    products: Arc<dyn ProductService>,
    toasts: ToastQueue,
    active_tab: Mutex<AdminTab>,
    dialog: Mutex<Option<AdminDialog>>,
    selection: Mutex<HashSet<ProductId>>,
    editing: Mutex<Option<ProductId>>,
}

impl AdminController {
    /// Create a controller over the shared catalog and product service.
    #[must_use]
    pub fn new(
        catalog: CatalogStore,
        products: Arc<dyn ProductService>,
        toasts: ToastQueue,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                catalog,
                products,
                toasts,
                active_tab: Mutex::new(AdminTab::default()),
                dialog: Mutex::new(None),
                selection: Mutex::new(HashSet::new()),
                editing: Mutex::new(None),
            }),
        }
    }

    // =========================================================================
    // Tabs & dialogs
    // =========================================================================

    #[must_use]
    pub fn active_tab(&self) -> AdminTab {
        self.inner
            .active_tab
            .lock()
            .map_or(AdminTab::default(), |guard| *guard)
    }

    pub fn set_tab(&self, tab: AdminTab) {
        if let Ok(mut guard) = self.inner.active_tab.lock() {
            *guard = tab;
        }
    }

    #[must_use]
    pub fn dialog(&self) -> Option<AdminDialog> {
        self.inner
            .dialog
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    pub fn open_dialog(&self, dialog: AdminDialog) {
        if let Ok(mut guard) = self.inner.dialog.lock() {
            *guard = Some(dialog);
        }
    }

    pub fn close_dialog(&self) {
        if let Ok(mut guard) = self.inner.dialog.lock() {
            *guard = None;
        }
    }

    // =========================================================================
    // Bulk selection
    // =========================================================================

    /// Currently selected product ids.
    #[must_use]
    pub fn selection(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self
            .inner
            .selection
            .lock()
            .map(|guard| guard.iter().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn is_selected(&self, id: &ProductId) -> bool {
        self.inner
            .selection
            .lock()
            .is_ok_and(|guard| guard.contains(id))
    }

    /// Toggle one product in and out of the selection.
    pub fn toggle_selected(&self, id: &ProductId) {
        let Ok(mut guard) = self.inner.selection.lock() else {
            return;
        };
        if !guard.remove(id) {
            guard.insert(id.clone());
        }
    }

    /// Select every listed product, or clear if everything is already
    /// selected (the header checkbox behavior).
    pub fn toggle_select_all(&self) {
        let products = self.inner.catalog.products();
        let Ok(mut guard) = self.inner.selection.lock() else {
            return;
        };
        if guard.len() == products.len() && !products.is_empty() {
            guard.clear();
        } else {
            *guard = products.iter().map(|p| p.id.clone()).collect();
        }
    }

    pub fn clear_selection(&self) {
        if let Ok(mut guard) = self.inner.selection.lock() {
            guard.clear();
        }
    }

    // =========================================================================
    // Bulk mutations
    // =========================================================================

    /// Set the status of every selected product, then force a refresh so
    /// the change is visible immediately. Clears the selection.
    ///
    /// # Errors
    ///
    /// Propagates the service error (the initiating UI shows it); the
    /// selection is kept so the user can retry.
    pub async fn bulk_set_status(&self, status: ProductStatus) -> Result<(), StoreError> {
        let ids = self.selection();
        if ids.is_empty() {
            return Ok(());
        }

        if let Err(e) = self.inner.products.update_status_bulk(&ids, status).await {
            tracing::error!(error = %e, count = ids.len(), "bulk status change failed");
            self.inner.toasts.error("No se pudo actualizar el estado");
            return Err(e.into());
        }

        self.clear_selection();
        self.inner.catalog.refresh(true, false).await;
        self.inner.toasts.success("Estado actualizado");
        Ok(())
    }

    /// Delete every selected product, then force a refresh. Clears the
    /// selection.
    ///
    /// # Errors
    ///
    /// Propagates the service error; the selection is kept for retry.
    pub async fn bulk_delete(&self) -> Result<(), StoreError> {
        let ids = self.selection();
        if ids.is_empty() {
            return Ok(());
        }

        if let Err(e) = self.inner.products.delete_bulk(&ids).await {
            tracing::error!(error = %e, count = ids.len(), "bulk delete failed");
            self.inner.toasts.error("Error al eliminar los productos");
            return Err(e.into());
        }

        self.clear_selection();
        self.close_dialog();
        self.inner.catalog.refresh(true, false).await;
        self.inner.toasts.success("Productos eliminados");
        Ok(())
    }

    // =========================================================================
    // Single-product mutations
    // =========================================================================

    /// Create a product and force a refresh.
    ///
    /// # Errors
    ///
    /// Propagates validation and service errors.
    pub async fn create_product(&self, input: CreateProductInput) -> Result<Product, StoreError> {
        match self.inner.products.create(input).await {
            Ok(product) => {
                self.close_dialog();
                self.inner.catalog.refresh(true, false).await;
                self.inner.toasts.success("Producto creado");
                Ok(product)
            }
            Err(e) => {
                tracing::error!(error = %e, "product create failed");
                self.inner.toasts.error("No se pudo crear el producto");
                Err(e.into())
            }
        }
    }

    /// Update a product, patching the catalog snapshot optimistically on
    /// success instead of waiting for a refetch.
    ///
    /// # Errors
    ///
    /// Propagates validation and service errors.
    pub async fn update_product(
        &self,
        id: &ProductId,
        updates: UpdateProductInput,
    ) -> Result<Product, StoreError> {
        match self.inner.products.update(id, updates).await {
            Ok(product) => {
                self.close_dialog();
                self.inner.catalog.patch(product.clone());
                self.inner.toasts.success("Producto actualizado");
                Ok(product)
            }
            Err(e) => {
                tracing::error!(error = %e, product = %id, "product update failed");
                self.inner.toasts.error("No se pudo actualizar el producto");
                Err(e.into())
            }
        }
    }

    /// Delete one product and force a refresh.
    ///
    /// # Errors
    ///
    /// Propagates the service error.
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), StoreError> {
        if let Err(e) = self.inner.products.delete(id).await {
            tracing::error!(error = %e, product = %id, "product delete failed");
            self.inner.toasts.error("Error al eliminar el producto");
            return Err(e.into());
        }
        self.close_dialog();
        self.inner.catalog.refresh(true, false).await;
        self.inner.toasts.success("Producto eliminado");
        Ok(())
    }

    /// Adjust stock (order fulfillment), then revalidate in the
    /// background without flashing a loading state.
    ///
    /// # Errors
    ///
    /// Propagates the service error.
    pub async fn adjust_stock(
        &self,
        id: &ProductId,
        delta: i32,
        variant_name: Option<&str>,
    ) -> Result<(), StoreError> {
        self.inner
            .products
            .update_stock(id, delta, variant_name)
            .await?;
        self.inner.catalog.refresh(true, true).await;
        Ok(())
    }

    /// Validate and upload an image, returning its public URL.
    ///
    /// # Errors
    ///
    /// Propagates validation and service errors.
    pub async fn upload_image(&self, upload: ImageUpload) -> Result<String, StoreError> {
        match self.inner.products.upload_image(upload).await {
            Ok(url) => Ok(url),
            Err(e) => {
                self.inner.toasts.error("Error al subir la imagen");
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Inline ERP editing
    // =========================================================================

    /// The row currently in edit mode, if any.
    #[must_use]
    pub fn editing(&self) -> Option<ProductId> {
        self.inner
            .editing
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    /// Enter edit mode for one row; at most one row is editable at a
    /// time, so any previous target is replaced.
    pub fn begin_edit(&self, id: &ProductId) {
        if let Ok(mut guard) = self.inner.editing.lock() {
            *guard = Some(id.clone());
        }
    }

    /// Leave edit mode without saving.
    pub fn cancel_edit(&self) {
        if let Ok(mut guard) = self.inner.editing.lock() {
            *guard = None;
        }
    }

    /// Commit the inline ERP edit for a row.
    ///
    /// On success the catalog snapshot is patched in place (perceived
    /// latency) and edit mode is cleared; on failure the edit target is
    /// preserved so the user can retry.
    ///
    /// # Errors
    ///
    /// Propagates the service error.
    pub async fn commit_erp_edit(
        &self,
        id: &ProductId,
        erp: ErpMetadata,
    ) -> Result<Product, StoreError> {
        let updates = UpdateProductInput {
            unit_cost: erp.unit_cost,
            location: erp.location,
            erp_category: erp.erp_category,
            ..UpdateProductInput::default()
        };

        match self.inner.products.update(id, updates).await {
            Ok(product) => {
                self.inner.catalog.patch(product.clone());
                self.cancel_edit();
                self.inner.toasts.success("Datos ERP actualizados");
                Ok(product)
            }
            Err(e) => {
                tracing::error!(error = %e, product = %id, "erp edit failed, keeping edit state");
                self.inner.toasts.error("No se pudo guardar los datos ERP");
                Err(e.into())
            }
        }
    }
}
