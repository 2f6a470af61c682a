mod entity;

use proc_macro::TokenStream;

/// Derive macro for the `HasIdentity` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Entity)]
/// #[entity(collection = "customers")]
/// struct Customer {
///     #[entity(id)]
///     pub customer_id: i64,
///     pub name: String,
/// }
/// ```
///
/// - `#[entity(collection = "...")]` sets the collection name.
///   If omitted, defaults to snake_case struct name + "s".
/// - `#[entity(id)]` marks the `i64` identity field.
///   If omitted, defaults to a field named `id`.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity::derive_entity(input)
}
