use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, Ident, LitStr, Type, parse_macro_input};

/// Declares the module configuration keys of a settings struct.
///
/// Adds `config_params()`, the declarations the file loader checks keys
/// and values against, and `from_config(&ConfigValues)`, which reads the
/// validated values back into the struct. Fields without a value keep
/// their `Default`, which is also the declared default of every key not
/// marked `required`.
///
/// ```ignore
/// #[derive(ConfigParams)]
/// pub struct ExportSettings {
///     #[param(key = "JSONOutputEnable", description = "Write history to JSON files")]
///     pub enabled: bool,
///
///     #[param(key = "JSONOutputPath", description = "Output directory", required)]
///     pub output_path: String,
/// }
/// ```
///
/// Field types: `bool`, `i64`, `u64`, `String`.
#[proc_macro_derive(ConfigParams, attributes(param))]
pub fn derive_config_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input).unwrap_or_else(syn::Error::into_compile_error).into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input.ident, "ConfigParams can only be derived for structs"));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(&input.ident, "ConfigParams needs named fields"));
    };

    let params = named.named.iter().map(ParamField::parse).collect::<syn::Result<Vec<_>>>()?;
    let declarations = params.iter().map(ParamField::declaration);
    let reads = params.iter().map(ParamField::read);

    let name = &input.ident;
    Ok(quote! {
        impl #name {
            pub fn config_params() -> ::std::vec::Vec<::history_api::config::ConfigParam> {
                let __defaults = <Self as ::std::default::Default>::default();
                ::std::vec![#(#declarations),*]
            }

            pub fn from_config(
                __values: &::history_api::config::ConfigValues,
            ) -> ::std::result::Result<Self, ::history_api::error::ExportError> {
                let mut __settings = <Self as ::std::default::Default>::default();
                #(#reads)*
                ::std::result::Result::Ok(__settings)
            }
        }
    })
}

// ════════════════════════════════════════════════════════════════
//  Field model
// ════════════════════════════════════════════════════════════════

enum Kind {
    Bool,
    I64,
    U64,
    Str,
}

impl Kind {
    fn of(ty: &Type) -> syn::Result<Self> {
        let last = match ty {
            Type::Path(p) => p.path.segments.last().map(|s| s.ident.to_string()),
            _ => None,
        };
        match last.as_deref() {
            Some("bool") => Ok(Kind::Bool),
            Some("i64") => Ok(Kind::I64),
            Some("u64") => Ok(Kind::U64),
            Some("String") => Ok(Kind::Str),
            _ => Err(syn::Error::new_spanned(ty, "config field must be bool, i64, u64 or String")),
        }
    }

    fn param_type(&self) -> TokenStream2 {
        match self {
            Kind::Bool => quote!(::history_api::config::ParamType::Bool),
            Kind::I64 => quote!(::history_api::config::ParamType::I64),
            Kind::U64 => quote!(::history_api::config::ParamType::U64),
            Kind::Str => quote!(::history_api::config::ParamType::Str),
        }
    }

    /// `ParamValue` built from `__defaults.<field>`.
    fn default_value(&self, field: &Ident) -> TokenStream2 {
        match self {
            Kind::Bool => quote!(::history_api::config::ParamValue::Bool(__defaults.#field)),
            Kind::I64 => quote!(::history_api::config::ParamValue::I64(__defaults.#field)),
            Kind::U64 => quote!(::history_api::config::ParamValue::U64(__defaults.#field)),
            Kind::Str => quote!(::history_api::config::ParamValue::Str(__defaults.#field.clone())),
        }
    }

    /// `Option<field type>` read from `__values`.
    fn lookup(&self, key: &LitStr) -> TokenStream2 {
        match self {
            Kind::Bool => quote!(__values.get_bool(#key)),
            Kind::I64 => quote!(__values.get_i64(#key)),
            Kind::U64 => quote!(__values.get_u64(#key)),
            Kind::Str => quote!(__values.get_str(#key).map(::std::string::ToString::to_string)),
        }
    }
}

struct ParamField {
    ident: Ident,
    key: LitStr,
    description: LitStr,
    required: bool,
    kind: Kind,
}

impl ParamField {
    fn parse(field: &Field) -> syn::Result<Self> {
        let Some(ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };

        let mut key = None;
        let mut description = None;
        let mut required = false;
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("param")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("key") {
                    key = Some(meta.value()?.parse::<LitStr>()?);
                } else if meta.path.is_ident("description") {
                    description = Some(meta.value()?.parse::<LitStr>()?);
                } else if meta.path.is_ident("required") {
                    required = true;
                } else {
                    return Err(meta.error("expected `key`, `description` or `required`"));
                }
                Ok(())
            })?;
        }

        let key = key.ok_or_else(|| syn::Error::new_spanned(&ident, "missing #[param(key = \"...\")]"))?;
        let description = description
            .ok_or_else(|| syn::Error::new_spanned(&ident, "missing #[param(description = \"...\")]"))?;
        let kind = Kind::of(&field.ty)?;

        Ok(Self { ident, key, description, required, kind })
    }

    fn declaration(&self) -> TokenStream2 {
        let Self { key, description, required, kind, .. } = self;
        let param_type = kind.param_type();
        let default = if *required {
            quote!(::std::option::Option::None)
        } else {
            let value = kind.default_value(&self.ident);
            quote!(::std::option::Option::Some(#value))
        };

        quote! {
            ::history_api::config::ConfigParam {
                name: ::std::string::String::from(#key),
                param_type: #param_type,
                required: #required,
                default: #default,
                description: ::std::string::String::from(#description),
            }
        }
    }

    fn read(&self) -> TokenStream2 {
        let Self { ident, key, .. } = self;
        let lookup = self.kind.lookup(key);
        if self.required {
            quote! {
                __settings.#ident = #lookup.ok_or_else(|| {
                    ::history_api::error::ExportError::config(
                        ::std::format!("missing required parameter '{}'", #key),
                    )
                })?;
            }
        } else {
            quote! {
                if let ::std::option::Option::Some(__value) = #lookup {
                    __settings.#ident = __value;
                }
            }
        }
    }
}
