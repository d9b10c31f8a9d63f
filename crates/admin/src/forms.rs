//! Product form state and validation.
//!
//! The form is the write-side guardian: everything it emits has already
//! been trimmed, bounded, and checked, so the service layer's own
//! validation never fires in practice. The primary-variant invariant
//! (at most one per product) is enforced here, at write time, not by the
//! backend.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use varmina_core::{
    CreateProductInput, Price, Product, ProductStatus, ProductValidationError,
    UpdateProductInput, Variant,
};

/// Form-level validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error(transparent)]
    Product(#[from] ProductValidationError),

    #[error("el nombre de la variante es obligatorio")]
    EmptyVariantName,

    #[error("variante duplicada: {0}")]
    DuplicateVariant(String),
}

/// One variant row in the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VariantForm {
    pub name: String,
    pub price: i64,
    pub images: Vec<String>,
    pub stock: Option<u32>,
    pub primary: bool,
}

/// Editable product form state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub images: Vec<String>,
    pub status: ProductStatus,
    pub collection: Option<String>,
    pub category: Option<String>,
    pub badge: Option<String>,
    pub variants: Vec<VariantForm>,
    pub stock: Option<u32>,
}

impl ProductForm {
    /// Empty form for the create dialog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefilled form for the edit dialog.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.clp(),
            images: product.images.clone(),
            status: product.status,
            collection: product.collection.clone(),
            category: product.category.clone(),
            badge: product.badge.clone(),
            variants: product.variants.iter().map(VariantForm::from).collect(),
            stock: product.stock,
        }
    }

    /// Mark the variant at `index` primary, unmarking every other one.
    ///
    /// Returns `false` when the index is out of range (form unchanged).
    pub fn set_primary_variant(&mut self, index: usize) -> bool {
        if index >= self.variants.len() {
            return false;
        }
        for (i, variant) in self.variants.iter_mut().enumerate() {
            variant.primary = i == index;
        }
        true
    }

    /// Validate and convert into a create input.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule: product-level checks (name,
    /// price) plus variant name presence and uniqueness.
    pub fn to_create_input(&self) -> Result<CreateProductInput, FormError> {
        let variants = self.validated_variants()?;
        let input = CreateProductInput {
            name: self.name.clone(),
            description: if self.description.trim().is_empty() {
                None
            } else {
                Some(self.description.clone())
            },
            price: Price::new(self.price),
            images: self.images.clone(),
            status: self.status,
            collection: self.collection.clone(),
            category: self.category.clone(),
            badge: self.badge.clone(),
            variants,
            stock: self.stock,
        };
        Ok(input.sanitized()?)
    }

    /// Validate and convert into a full update for an existing product.
    ///
    /// # Errors
    ///
    /// Same rules as [`Self::to_create_input`].
    pub fn to_update_input(&self) -> Result<UpdateProductInput, FormError> {
        let create = self.to_create_input()?;
        Ok(UpdateProductInput {
            name: Some(create.name),
            description: Some(create.description.unwrap_or_default()),
            price: Some(create.price),
            images: Some(create.images),
            status: Some(create.status),
            collection: create.collection,
            category: create.category,
            badge: create.badge,
            variants: Some(create.variants),
            stock: create.stock,
            ..UpdateProductInput::default()
        })
    }

    fn validated_variants(&self) -> Result<Vec<Variant>, FormError> {
        let mut seen = Vec::with_capacity(self.variants.len());
        let mut variants = Vec::with_capacity(self.variants.len());
        for form in &self.variants {
            let name = form.name.trim();
            if name.is_empty() {
                return Err(FormError::EmptyVariantName);
            }
            if seen.contains(&name) {
                return Err(FormError::DuplicateVariant(name.to_owned()));
            }
            seen.push(name);
            variants.push(Variant {
                name: name.to_owned(),
                price: Price::new(form.price),
                images: form.images.clone(),
                stock: form.stock,
                primary: form.primary,
            });
        }
        Ok(variants)
    }
}

impl From<&Variant> for VariantForm {
    fn from(variant: &Variant) -> Self {
        Self {
            name: variant.name.clone(),
            price: variant.price.clp(),
            images: variant.images.clone(),
            stock: variant.stock,
            primary: variant.primary,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form_with_variants(names: &[&str]) -> ProductForm {
        ProductForm {
            name: "Anillo Sol Real".to_owned(),
            price: 3_990_000,
            variants: names
                .iter()
                .map(|n| VariantForm {
                    name: (*n).to_owned(),
                    price: 100,
                    ..VariantForm::default()
                })
                .collect(),
            ..ProductForm::default()
        }
    }

    #[test]
    fn primary_flag_moves_not_spreads() {
        let mut form = form_with_variants(&["Plata", "Oro 18k", "Oro 24k"]);
        assert!(form.set_primary_variant(1));
        assert!(form.set_primary_variant(2));

        let primaries: Vec<bool> = form.variants.iter().map(|v| v.primary).collect();
        assert_eq!(primaries, vec![false, false, true]);
    }

    #[test]
    fn out_of_range_primary_is_rejected() {
        let mut form = form_with_variants(&["Plata"]);
        assert!(!form.set_primary_variant(5));
        assert!(!form.variants[0].primary);
    }

    #[test]
    fn duplicate_variant_names_fail_validation() {
        let form = form_with_variants(&["Oro", "  Oro "]);
        assert_eq!(
            form.to_create_input().unwrap_err(),
            FormError::DuplicateVariant("Oro".to_owned())
        );
    }

    #[test]
    fn blank_variant_name_fails_validation() {
        let form = form_with_variants(&["   "]);
        assert_eq!(
            form.to_create_input().unwrap_err(),
            FormError::EmptyVariantName
        );
    }

    #[test]
    fn product_rules_still_apply() {
        let mut form = form_with_variants(&[]);
        form.name = "  ".to_owned();
        assert_eq!(
            form.to_create_input().unwrap_err(),
            FormError::Product(ProductValidationError::EmptyName)
        );

        let mut negative = form_with_variants(&[]);
        negative.price = -100;
        assert_eq!(
            negative.to_create_input().unwrap_err(),
            FormError::Product(ProductValidationError::NegativePrice)
        );
    }

    #[test]
    fn update_input_carries_every_field() {
        let mut form = form_with_variants(&["Oro"]);
        form.description = "Anillo de sello forjado a mano.".to_owned();
        form.status = ProductStatus::MadeToOrder;

        let update = form.to_update_input().unwrap();
        assert_eq!(update.name.as_deref(), Some("Anillo Sol Real"));
        assert_eq!(update.status, Some(ProductStatus::MadeToOrder));
        assert_eq!(update.variants.as_ref().unwrap().len(), 1);
        assert!(update.unit_cost.is_none());
    }
}
