// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core traits for host documents
//!
//! These traits define what the maintenance engine needs from a live host
//! document. Hosts are single-threaded; none of these traits require
//! `Send` or `Sync`.

use crate::{
    Category, ElementClass, ElementId, ElementInfo, HostError, LineSegment, ParameterValue,
    Result, WarningInstance, Xyz,
};

/// Read-only element access - the host's collector API
///
/// Collectors return elements in host order. Callers that need a stable
/// order must not rely on it being sorted.
pub trait ElementQuery {
    /// Look up a single element
    fn element(&self, id: ElementId) -> Option<ElementInfo>;

    /// Collect every element of a category
    ///
    /// This reaches loaded family symbols but not built-in types, which
    /// only a class query returns.
    fn elements_by_category(&self, category: &Category) -> Vec<ElementInfo>;

    /// Collect every element of a class
    fn elements_by_class(&self, class: &ElementClass) -> Vec<ElementInfo>;

    /// Ids of every element in the document
    fn all_ids(&self) -> Vec<ElementId>;

    /// Read a named parameter
    ///
    /// # Returns
    /// `None` if the element or the parameter does not exist
    fn parameter(&self, id: ElementId, name: &str) -> Option<ParameterValue>;

    /// Anchor point of a placed element (tag head, family insertion point)
    fn location(&self, id: ElementId) -> Option<Xyz>;

    /// Geometry of a line-based element (separation and boundary lines)
    fn curve(&self, _id: ElementId) -> Option<LineSegment> {
        None
    }
}

/// Convenience lookups built on [`ElementQuery`]
pub trait ElementQueryExt: ElementQuery {
    /// Check whether an element exists
    fn exists(&self, id: ElementId) -> bool {
        self.element(id).is_some()
    }

    /// Look up an element, failing if it is missing
    fn element_or_err(&self, id: ElementId) -> Result<ElementInfo> {
        self.element(id).ok_or(HostError::ElementNotFound(id))
    }

    /// Element name, or a placeholder for missing elements
    fn display_name(&self, id: ElementId) -> String {
        self.element(id)
            .map(|e| e.name)
            .unwrap_or_else(|| "<missing>".to_string())
    }
}

impl<T: ElementQuery + ?Sized> ElementQueryExt for T {}

/// Element mutation
///
/// Every method fails with [`HostError::NoOpenTransaction`] when called
/// outside a transaction.
pub trait ElementEditor {
    /// Write a named parameter
    fn set_parameter(&mut self, id: ElementId, name: &str, value: ParameterValue) -> Result<()>;

    /// Move a placed element by a vector
    fn move_element(&mut self, id: ElementId, by: Xyz) -> Result<()>;

    /// Replace the geometry of a line-based element
    fn set_curve(&mut self, id: ElementId, curve: LineSegment) -> Result<()>;

    /// Delete elements
    ///
    /// # Returns
    /// Every id actually removed, including elements the host deleted
    /// because they depended on a requested one
    fn delete_elements(&mut self, ids: &[ElementId]) -> Result<Vec<ElementId>>;
}

/// Transaction primitives
///
/// At most one transaction is open at a time. Rolling back restores the
/// document to its state at `begin_transaction`.
pub trait TransactionHost {
    /// Start a named transaction
    fn begin_transaction(&mut self, name: &str) -> Result<()>;

    /// Make the open transaction's changes permanent
    fn commit_transaction(&mut self) -> Result<()>;

    /// Discard the open transaction's changes
    fn rollback_transaction(&mut self) -> Result<()>;

    /// Check whether a transaction is open
    fn has_open_transaction(&self) -> bool;
}

/// Host warning enumeration
pub trait WarningSource {
    /// Every warning currently reported by the host
    fn warnings(&self) -> Vec<WarningInstance>;
}

/// The full host document
///
/// # Example
///
/// ```ignore
/// use bim_upkeep_model::{Document, ElementQuery};
///
/// fn summary(doc: &dyn Document) -> String {
///     format!("{}: {} elements", doc.title(), doc.all_ids().len())
/// }
/// ```
pub trait Document: ElementQuery + ElementEditor + TransactionHost + WarningSource {
    /// Document title (file name without extension)
    fn title(&self) -> &str;

    /// View this document through its query interface
    fn as_query(&self) -> &dyn ElementQuery;
}
