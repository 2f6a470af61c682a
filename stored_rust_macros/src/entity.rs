use proc_macro::TokenStream;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Data, DeriveInput, Field, Fields, Ident, LitStr, Token};

pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let collection = match extract_collection(&input) {
        Ok(collection) => collection,
        Err(err) => return err.to_compile_error().into(),
    };

    let id_field = match extract_id_field(&input) {
        Ok(field) => field,
        Err(err) => return err.to_compile_error().into(),
    };
    let id_field_name = match serialized_id_name(&input, &id_field) {
        Ok(name) => name,
        Err(err) => return err.to_compile_error().into(),
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::stored_rust::HasIdentity for #name #ty_generics #where_clause {
            const COLLECTION: &'static str = #collection;
            const ID_FIELD: &'static str = #id_field_name;

            fn id(&self) -> ::stored_rust::Identity {
                self.#id_field
            }

            fn set_id(&mut self, id: ::stored_rust::Identity) {
                self.#id_field = id;
            }
        }
    };

    TokenStream::from(expanded)
}

fn extract_collection(input: &DeriveInput) -> syn::Result<String> {
    for attr in &input.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }

        let mut collection = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                collection = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported entity attribute, expected `collection = \"...\"`"))
            }
        })?;

        if let Some(c) = collection {
            if c.is_empty() {
                return Err(syn::Error::new_spanned(attr, "entity collection must not be empty"));
            }
            return Ok(c);
        }
    }

    // snake_case struct name + "s"
    Ok(format!("{}s", to_snake_case(&input.ident.to_string())))
}

fn extract_id_field(input: &DeriveInput) -> syn::Result<Ident> {
    for field in named_fields(input)? {
        for attr in &field.attrs {
            if !attr.path().is_ident("entity") {
                continue;
            }
            let mut is_id = false;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    is_id = true;
                    Ok(())
                } else {
                    Err(meta.error("unsupported field attribute, expected `id`"))
                }
            })?;
            if is_id {
                if let Some(ident) = &field.ident {
                    return Ok(ident.clone());
                }
            }
        }
    }

    named_fields(input)?
        .filter_map(|field| field.ident.as_ref())
        .find(|ident| *ident == "id")
        .cloned()
        .ok_or_else(|| {
            syn::Error::new_spanned(
                &input.ident,
                "Entity derive: no field marked with #[entity(id)] and no field named `id`",
            )
        })
}

/// Key the identity field is stored under once serde has serialized it.
///
/// Honours `#[serde(rename = "..")]` on the field and
/// `#[serde(rename_all = "..")]` on the struct.
fn serialized_id_name(input: &DeriveInput, id_field: &Ident) -> syn::Result<String> {
    let field = named_fields(input)?
        .find(|field| field.ident.as_ref() == Some(id_field))
        .ok_or_else(|| syn::Error::new_spanned(id_field, "identity field not found"))?;

    if let Some(rename) = serde_string(&field.attrs, "rename")? {
        return Ok(rename.value());
    }

    let name = id_field.to_string();
    let name = name.strip_prefix("r#").unwrap_or(&name);
    match serde_string(&input.attrs, "rename_all")? {
        Some(rule) => apply_rename_rule(&rule, name),
        None => Ok(name.to_string()),
    }
}

fn named_fields(input: &DeriveInput) -> syn::Result<impl Iterator<Item = &Field>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(fields.named.iter()),
            _ => Err(syn::Error::new_spanned(
                &input.ident,
                "Entity derive requires a struct with named fields",
            )),
        },
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            "Entity derive can only be used on structs",
        )),
    }
}

/// Value of `#[serde(<key> = "..")]`, skipping every other serde option.
fn serde_string(attrs: &[Attribute], key: &str) -> syn::Result<Option<LitStr>> {
    let mut found = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if !meta.path.is_ident(key) {
                return skip_serde_option(&meta);
            }
            if !meta.input.peek(Token![=]) {
                return Err(meta.error(format!(
                    "Entity derive reads only the `{key} = \"...\"` form"
                )));
            }
            found = Some(meta.value()?.parse::<LitStr>()?);
            Ok(())
        })?;
    }
    Ok(found)
}

fn skip_serde_option(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let _nested;
        syn::parenthesized!(_nested in meta.input);
    }
    Ok(())
}

fn apply_rename_rule(rule: &LitStr, field: &str) -> syn::Result<String> {
    let renamed = match rule.value().as_str() {
        "lowercase" | "snake_case" => field.to_string(),
        "UPPERCASE" | "SCREAMING_SNAKE_CASE" => field.to_ascii_uppercase(),
        "PascalCase" => to_pascal_case(field),
        "camelCase" => {
            let pascal = to_pascal_case(field);
            let mut chars = pascal.chars();
            match chars.next() {
                Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                None => pascal,
            }
        }
        "kebab-case" => field.replace('_', "-"),
        "SCREAMING-KEBAB-CASE" => field.replace('_', "-").to_ascii_uppercase(),
        other => {
            return Err(syn::Error::new_spanned(
                rule,
                format!("unknown serde rename_all rule `{other}`"),
            ))
        }
    };
    Ok(renamed)
}

fn to_pascal_case(field: &str) -> String {
    let mut result = String::new();
    let mut capitalize = true;
    for ch in field.chars() {
        if ch == '_' {
            capitalize = true;
        } else if capitalize {
            result.push(ch.to_ascii_uppercase());
            capitalize = false;
        } else {
            result.push(ch);
        }
    }
    result
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}
