//! Read-only wrappers over fetched records.
//!
//! Every Goodreads resource is the same shape: a `Record` decoded from one
//! XML element plus a handful of named fields. `Resource<K>` is that shape;
//! the zero-sized kind `K` says which resource it is and which field labels
//! it when printed. Kind-specific accessors live in `impl Resource<Kind>`
//! blocks below.

use std::fmt;
use std::marker::PhantomData;

use crate::error::Result;
use crate::record::Record;

/// Compile-time description of a resource kind.
pub trait ResourceKind {
    /// Name of the XML element one resource is decoded from.
    const ELEMENT: &'static str;
    /// Field shown by `Display`; the `id` is used when it is absent or empty.
    const LABEL: &'static str;
}

pub struct Resource<K> {
    record: Record,
    kind: PhantomData<K>,
}

impl<K: ResourceKind> Resource<K> {
    pub fn new(record: Record) -> Self {
        Self {
            record,
            kind: PhantomData,
        }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    /// Goodreads identifier.
    pub fn gid(&self) -> Result<&str> {
        self.record.text("id")
    }

    pub(crate) fn text(&self, key: &str) -> Result<&str> {
        self.record.text(key)
    }

    pub(crate) fn optional_text(&self, key: &str) -> Result<Option<&str>> {
        self.record.optional_text(key)
    }

    /// Human-readable label; not an identity key.
    pub fn label(&self) -> &str {
        let label = self.record.optional_text(K::LABEL).ok().flatten();
        match label {
            Some(label) if !label.is_empty() => label,
            _ => self.record.optional_text("id").ok().flatten().unwrap_or_default(),
        }
    }
}

impl<K: ResourceKind> From<Record> for Resource<K> {
    fn from(record: Record) -> Self {
        Self::new(record)
    }
}

impl<K> Clone for Resource<K> {
    fn clone(&self) -> Self {
        Self {
            record: self.record.clone(),
            kind: PhantomData,
        }
    }
}

impl<K: ResourceKind> fmt::Debug for Resource<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(K::ELEMENT).field("record", &self.record).finish()
    }
}

impl<K: ResourceKind> fmt::Display for Resource<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

macro_rules! resource_kind {
    ($(#[$doc:meta])* $kind:ident, $alias:ident, $element:literal, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub enum $kind {}

        impl ResourceKind for $kind {
            const ELEMENT: &'static str = $element;
            const LABEL: &'static str = $label;
        }

        $(#[$doc])*
        pub type $alias = Resource<$kind>;
    };
}

resource_kind!(
    /// A user's profile snapshot.
    UserKind, UserProfile, "user", "user_name"
);
resource_kind!(
    /// A group the user belongs to.
    GroupKind, Group, "group", "title"
);
resource_kind!(
    /// One of the user's shelves.
    ShelfKind, Shelf, "user_shelf", "name"
);
resource_kind!(
    /// A book as embedded in reviews and owned-book entries.
    BookKind, Book, "book", "title"
);
resource_kind!(
    /// A shelved book with the user's rating and review text.
    ReviewKind, Review, "review", "id"
);
resource_kind!(
    /// A book the user owns.
    OwnedBookKind, OwnedBook, "owned_book", "id"
);

impl Resource<UserKind> {
    pub fn user_name(&self) -> Result<&str> {
        self.text("user_name")
    }

    pub fn name(&self) -> Result<&str> {
        self.text("name")
    }

    pub fn link(&self) -> Result<&str> {
        self.text("link")
    }

    pub fn image_url(&self) -> Result<&str> {
        self.text("image_url")
    }

    pub fn small_image_url(&self) -> Result<&str> {
        self.text("small_image_url")
    }
}

impl Resource<GroupKind> {
    pub fn title(&self) -> Result<&str> {
        self.text("title")
    }

    pub fn users_count(&self) -> Result<&str> {
        self.text("users_count")
    }

    pub fn link(&self) -> Result<&str> {
        self.text("link")
    }
}

impl Resource<ShelfKind> {
    pub fn name(&self) -> Result<&str> {
        self.text("name")
    }

    pub fn book_count(&self) -> Result<&str> {
        self.text("book_count")
    }

    /// Whether a book on this shelf can sit on no other exclusive shelf.
    pub fn exclusive(&self) -> Result<bool> {
        Ok(self.text("exclusive_flag")? == "true")
    }
}

impl Resource<BookKind> {
    pub fn title(&self) -> Result<&str> {
        self.text("title")
    }

    pub fn isbn(&self) -> Result<Option<&str>> {
        self.optional_text("isbn")
    }

    pub fn link(&self) -> Result<&str> {
        self.text("link")
    }
}

impl Resource<ReviewKind> {
    pub fn rating(&self) -> Result<&str> {
        self.text("rating")
    }

    pub fn body(&self) -> Result<Option<&str>> {
        self.optional_text("body")
    }

    pub fn url(&self) -> Result<&str> {
        self.text("url")
    }

    pub fn book(&self) -> Result<Book> {
        self.record().record_at(&["book"]).map(Book::new)
    }
}

impl Resource<OwnedBookKind> {
    pub fn condition(&self) -> Result<Option<&str>> {
        self.optional_text("condition")
    }

    pub fn purchase_location(&self) -> Result<Option<&str>> {
        self.optional_text("original_purchase_location")
    }

    pub fn book(&self) -> Result<Book> {
        self.record().record_at(&["book"]).map(Book::new)
    }
}
