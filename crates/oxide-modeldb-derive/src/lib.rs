//! Derive macro for record metadata.
//!
//! This crate provides the `#[derive(Model)]` macro, which implements the
//! `Record` and `Model` traits of `oxide-modeldb-core` for a struct with
//! named fields.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, LitStr, Type, parse_macro_input};

/// Derives `Record` and `Model` for a struct.
///
/// # Attributes
///
/// - `#[table(name = "table_name")]` - Specifies the SQL table name (optional,
///   defaults to the lower-cased struct name)
///
/// # Field Attributes
///
/// - `#[db("column")]` - Maps the field to `column`
/// - `#[db("column,null")]` - The column may hold NULL; a NULL leaves the
///   field at its zero value, and a zero value is inserted as NULL
/// - `#[db("column,autoinc")]` - The database generates the value; the
///   field is read back but never inserted
///
/// Fields without `#[db]` are not mapped. `Option<T>` fields read NULL as
/// `None` without the `null` option; with it, only `None` is inserted as
/// NULL. An `Option<T>` autoincrement key is allowed.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug, Default, Model)]
/// #[table(name = "users")]
/// struct User {
///     #[db("id,autoinc")]
///     id: i64,
///     #[db("email,null")]
///     email: String,
///     #[db("token")]
///     token: String,
/// }
/// ```
#[proc_macro_derive(Model, attributes(db, table))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_model_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_model_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let type_name = struct_name.to_string();
    let table_name = get_table_name(&input.attrs)?;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Model derive does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Model derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Model derive only supports structs",
            ));
        }
    };

    let mut mapped: Vec<MappedField> = Vec::new();
    for field in fields {
        let Some(attrs) = parse_db_attr(&field.attrs)? else {
            continue;
        };
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        if let Some(prev) = mapped.iter().find(|m| m.column == attrs.column) {
            return Err(syn::Error::new(
                attrs.span,
                format!(
                    "column `{}` is already mapped by field `{}`",
                    attrs.column, prev.ident
                ),
            ));
        }
        mapped.push(MappedField {
            ident,
            ty: field.ty.clone(),
            column: attrs.column,
            nullable: attrs.nullable,
            autoincrement: attrs.autoincrement,
        });
    }

    let core = quote!(::oxide_modeldb_core);

    let field_defs: Vec<TokenStream2> = mapped
        .iter()
        .map(|f| {
            let ident = f.ident.to_string();
            let column = &f.column;
            let ty = &f.ty;
            let nullable = f.nullable;
            let autoincrement = f.autoincrement;
            quote! {
                #core::FieldDef {
                    ident: #ident,
                    column: #column,
                    nullable: #nullable,
                    optional: <#ty as #core::SqlType>::NULLABLE,
                    autoincrement: #autoincrement,
                    kind: <#ty as #core::SqlType>::KIND,
                }
            }
        })
        .collect();

    let value_exprs: Vec<TokenStream2> = mapped
        .iter()
        .map(|f| {
            let ident = &f.ident;
            quote! { #core::ToSqlValue::to_sql_value(&self.#ident) }
        })
        .collect();

    let zero_exprs: Vec<TokenStream2> = mapped
        .iter()
        .map(|f| {
            let ident = &f.ident;
            quote! { #core::ToSqlValue::is_zero_value(&self.#ident) }
        })
        .collect();

    let set_arms: Vec<TokenStream2> = mapped
        .iter()
        .enumerate()
        .map(|(index, f)| {
            let ident = &f.ident;
            quote! {
                #index => {
                    self.#ident = #core::FromSqlValue::from_sql_value(value)?;
                    ::core::result::Result::Ok(())
                }
            }
        })
        .collect();

    let table_token = match table_name {
        Some(name) => quote! { ::core::option::Option::Some(#name) },
        None => quote! { ::core::option::Option::None },
    };

    let expanded = quote! {
        impl #core::Record for #struct_name {
            fn model_def(&self) -> &'static #core::ModelDef {
                <Self as #core::Model>::DEF
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn field_values(&self) -> ::std::vec::Vec<#core::SqlValue> {
                ::std::vec![#(#value_exprs),*]
            }

            fn zero_fields(&self) -> ::std::vec::Vec<bool> {
                ::std::vec![#(#zero_exprs),*]
            }

            fn set_field(
                &mut self,
                index: usize,
                value: #core::SqlValue,
            ) -> ::core::result::Result<(), #core::ValueError> {
                match index {
                    #(#set_arms)*
                    _ => {
                        let _ = value;
                        ::core::result::Result::Err(#core::ValueError::UnknownField { index })
                    }
                }
            }
        }

        impl #core::Model for #struct_name {
            const DEF: &'static #core::ModelDef = &#core::ModelDef {
                type_name: #type_name,
                table: #table_token,
                fields: &[#(#field_defs),*],
            };
        }
    };

    Ok(expanded)
}

struct MappedField {
    ident: Ident,
    ty: Type,
    column: String,
    nullable: bool,
    autoincrement: bool,
}

struct DbAttrs {
    column: String,
    nullable: bool,
    autoincrement: bool,
    span: proc_macro2::Span,
}

fn get_table_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    for attr in attrs {
        if attr.path().is_ident("table") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: Expr = meta.value()?.parse()?;
                    if let Expr::Lit(lit) = value {
                        if let Lit::Str(s) = lit.lit {
                            table_name = Some(s.value());
                            return Ok(());
                        }
                    }
                    return Err(meta.error("expected a string literal table name"));
                }
                Err(meta.error("unsupported table attribute"))
            })?;
            if let Some(name) = table_name {
                if name.is_empty() {
                    return Err(syn::Error::new_spanned(attr, "table name cannot be empty"));
                }
                return Ok(Some(name));
            }
        }
    }
    Ok(None)
}

/// Parses `#[db("column[,null][,autoinc]")]`, if present.
fn parse_db_attr(attrs: &[Attribute]) -> syn::Result<Option<DbAttrs>> {
    let Some(attr) = attrs.iter().find(|a| a.path().is_ident("db")) else {
        return Ok(None);
    };
    let literal: LitStr = attr.parse_args()?;
    let span = literal.span();
    let text = literal.value();

    let mut parts = text.split(',').map(str::trim);
    let column = parts.next().unwrap_or_default().to_string();
    if column.is_empty() {
        return Err(syn::Error::new(span, "column name cannot be empty"));
    }

    let mut result = DbAttrs {
        column,
        nullable: false,
        autoincrement: false,
        span,
    };
    for option in parts {
        match option {
            "null" => result.nullable = true,
            "autoinc" => result.autoincrement = true,
            other => {
                return Err(syn::Error::new(
                    span,
                    format!("unknown db option `{other}`, expected `null` or `autoinc`"),
                ));
            }
        }
    }
    if result.nullable && result.autoincrement {
        return Err(syn::Error::new(
            span,
            "a field cannot be both `null` and `autoinc`",
        ));
    }

    Ok(Some(result))
}
