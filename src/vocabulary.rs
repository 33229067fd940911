//! Well-known identifiers used by sitemap ontologies and hypermedia output.

/// [Linked Data Templates](https://www.w3.org/ns/ldt#) vocabulary.
pub mod ldt {
    use oxrdf::NamedNodeRef;

    pub const TEMPLATE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt#Template");
    pub const PATH: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt#path");
    pub const SEGMENT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt#segment");
    pub const FRAGMENT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt#fragment");
    pub const QUERY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt#query");
    pub const UPDATE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt#update");
    pub const PRIORITY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt#priority");
    pub const PARAM: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt#param");
    pub const LANG: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt#lang");
    pub const LOAD_CLASS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt#loadClass");
    pub const CACHE_CONTROL: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt#cacheControl");
}

/// Document hierarchy vocabulary: containers and pages.
pub mod ldth {
    use oxrdf::NamedNodeRef;

    pub const CONTAINER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt/document-hierarchy/domain#Container");
    pub const PAGE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt/document-hierarchy/domain#Page");
    pub const PAGE_OF: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt/document-hierarchy/domain#pageOf");
    pub const LIMIT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt/document-hierarchy/domain#limit");
    pub const OFFSET: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt/document-hierarchy/domain#offset");
    pub const ORDER_BY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt/document-hierarchy/domain#orderBy");
    pub const DESC: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt/document-hierarchy/domain#desc");
}

/// Core domain vocabulary: parameterized views.
pub mod ldtc {
    use oxrdf::NamedNodeRef;

    pub const VIEW: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt/core/domain#View");
    pub const VIEW_OF: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/ldt/core/domain#viewOf");
}

/// XHTML link relations.
pub mod xhv {
    use oxrdf::NamedNodeRef;

    pub const NEXT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/1999/xhtml/vocab#next");
    pub const PREV: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/1999/xhtml/vocab#prev");
}

/// Structural parent/container properties.
pub mod sioc {
    use oxrdf::NamedNodeRef;

    pub const HAS_PARENT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/sioc/ns#has_parent");
    pub const HAS_CONTAINER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/sioc/ns#has_container");
}

pub use oxrdf::vocab::{rdf, rdfs, xsd};
