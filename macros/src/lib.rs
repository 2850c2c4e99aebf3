use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Meta, Token, Type, parse_macro_input};

/// Field types with a built-in coercion
const SUPPORTED_TYPES: &[&str] = &["String", "bool", "i32", "i64", "f32", "Seconds"];

/// Define a configuration record bound from environment variables
///
/// ```ignore
/// define_config! {
///     #[derive(Debug)]
///     pub struct Config {
///         #[field(env = "HTTP_PORT", default = "1234", doc = "HTTP listener port")]
///         pub http_port: i32,
///
///         #[field(env = "DB_PASSWORD", optional)]
///         pub db_password: String,
///     }
/// }
/// ```
///
/// Fields without `#[field(env = ...)]` are left at their `Default` value.
#[proc_macro]
pub fn define_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_config(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_config(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_name = &input.ident;
    let vis = &input.vis;
    let struct_attrs = &input.attrs;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let generics = &input.generics;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "define_config! only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "define_config! only supports structs",
            ));
        }
    };

    let mut field_defs = Vec::new();
    let mut bind_stmts = Vec::new();
    let mut field_names = Vec::new();
    let mut metadata_stmts = Vec::new();

    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let field_vis = &field.vis;
        let field_type = &field.ty;

        let config = parse_field_config(&field.attrs)?;

        // Everything but our own attribute stays on the struct
        let kept_attrs: Vec<&Attribute> = field
            .attrs
            .iter()
            .filter(|attr| !attr.path().is_ident("field"))
            .collect();
        let cfg_attrs: Vec<&Attribute> = field
            .attrs
            .iter()
            .filter(|attr| attr.path().is_ident("cfg"))
            .collect();

        field_defs.push(quote! {
            #(#kept_attrs)*
            #field_vis #field_name: #field_type
        });
        field_names.push(quote! {
            #(#cfg_attrs)*
            #field_name
        });

        let Some(config) = config else {
            bind_stmts.push(quote! {
                #(#cfg_attrs)*
                let #field_name: #field_type = ::core::default::Default::default();
            });
            continue;
        };

        let FieldConfig {
            env_var,
            default,
            optional,
            description,
        } = config;
        let descriptor = quote! {
            ::envbind::FieldDescriptor::extract(#env_var, #default, #optional, #description)
        };

        let (bind_code, kind) = if is_supported(field_type) {
            (
                quote! {
                    #(#cfg_attrs)*
                    let #field_name = binder.field::<#field_type>(#descriptor)?;
                },
                quote! { <#field_type as ::envbind::Bindable>::KIND },
            )
        } else {
            let type_name = type_name(field_type);
            (
                quote! {
                    #(#cfg_attrs)*
                    let #field_name = binder.unsupported::<#field_type>(#descriptor, #type_name)?;
                },
                quote! { ::envbind::FieldKind::Unsupported(#type_name) },
            )
        };

        bind_stmts.push(bind_code);
        metadata_stmts.push(quote! {
            #(#cfg_attrs)*
            fields.extend(::envbind::FieldMetadata::describe(#descriptor, #kind));
        });
    }

    let struct_def = quote! {
        #(#struct_attrs)*
        #vis struct #struct_name #generics #where_clause {
            #(#field_defs),*
        }
    };

    let bind_impl = quote! {
        impl #impl_generics ::envbind::Bind for #struct_name #ty_generics #where_clause {
            fn bind_fields(
                binder: &mut ::envbind::Binder<'_>,
            ) -> ::core::result::Result<Self, ::envbind::BindError> {
                #(#bind_stmts)*

                ::core::result::Result::Ok(Self {
                    #(#field_names),*
                })
            }

            fn fields() -> ::std::vec::Vec<::envbind::FieldMetadata> {
                #[allow(unused_mut)]
                let mut fields = ::std::vec::Vec::new();

                #(#metadata_stmts)*

                fields
            }
        }
    };

    Ok(quote! {
        #struct_def
        #bind_impl
    })
}

#[derive(Debug)]
struct FieldConfig {
    env_var: String,
    default: String,
    optional: bool,
    description: String,
}

/// Parse `#[field(env = "X", default = "1", doc = "Y", optional)]`
///
/// Returns `None` for fields without a `#[field]` attribute.
fn parse_field_config(attrs: &[Attribute]) -> syn::Result<Option<FieldConfig>> {
    let Some(field_attr) = attrs.iter().find(|attr| attr.path().is_ident("field")) else {
        return Ok(None);
    };

    let list = match &field_attr.meta {
        Meta::List(list) => list,
        _ => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "field attribute must be a list: #[field(env = \"...\", ...)]",
            ));
        }
    };

    let mut env_var = None;
    let mut default = String::new();
    let mut optional = false;
    let mut description = String::new();

    list.parse_nested_meta(|meta| {
        let key = meta
            .path
            .get_ident()
            .ok_or_else(|| meta.error("expected identifier"))?
            .to_string();

        match key.as_str() {
            "env" => {
                meta.input.parse::<Token![=]>()?;
                let value: syn::LitStr = meta.input.parse()?;
                env_var = Some(value.value());
            }
            "default" => {
                meta.input.parse::<Token![=]>()?;
                let value: syn::LitStr = meta.input.parse().map_err(|_| {
                    meta.error("default must be a string literal, e.g. default = \"1234\"")
                })?;
                default = value.value();
            }
            "doc" => {
                meta.input.parse::<Token![=]>()?;
                let value: syn::LitStr = meta.input.parse()?;
                description = value.value().trim().to_string();
            }
            "optional" => {
                if meta.input.peek(Token![=]) {
                    meta.input.parse::<Token![=]>()?;
                    let value: syn::LitBool = meta.input.parse()?;
                    optional = value.value;
                } else {
                    optional = true;
                }
            }
            _ => return Err(meta.error(format!("unknown field option `{}`", key))),
        }

        Ok(())
    })?;

    let Some(env_var) = env_var else {
        return Err(syn::Error::new_spanned(
            field_attr,
            "field must have env = \"VAR_NAME\"",
        ));
    };

    // Fall back to the field's doc comment
    if description.is_empty() {
        description = doc_comment(attrs);
    }

    Ok(Some(FieldConfig {
        env_var,
        default,
        optional,
        description,
    }))
}

fn doc_comment(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether the type's last path segment is one of the built-in coercions
fn is_supported(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty
        && type_path.qself.is_none()
        && let Some(segment) = type_path.path.segments.last()
        && segment.arguments.is_empty()
    {
        return SUPPORTED_TYPES.iter().any(|name| segment.ident == *name);
    }
    false
}

fn type_name(ty: &Type) -> String {
    quote!(#ty).to_string().replace(' ', "")
}
