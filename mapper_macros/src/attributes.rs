//! Attribute parsing for `#[derive(Mappable)]`

use syn::parse::ParseStream;
use syn::{Attribute, Field, Ident, LitStr, Path, Token};

/// Container-level settings from `#[mapping(...)]`
#[derive(Default)]
pub struct ContainerAttrs {
    pub name:      Option<String>,
    pub configure: Option<Path>,
    pub default:   bool,
}

/// One `#[complex_bind(...)]`
pub struct ComplexBindAttr {
    pub dest:   String,
    pub source: String,
}

/// Field-level binding rules
#[derive(Default)]
pub struct FieldAttrs {
    pub bind_to:       Option<(String, bool)>,
    pub complex_binds: Vec<ComplexBindAttr>,
    pub ignore:        bool,
    pub converter:     Option<String>,
}

/// Parse every `#[mapping(...)]` on the container
pub fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut container = ContainerAttrs::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("mapping")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().trim().is_empty() {
                    return Err(meta.error("mapping name must not be empty"));
                }
                container.name = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("configure") {
                container.configure = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("default") {
                container.default = true;
                Ok(())
            } else {
                Err(meta.error("unsupported mapping attribute"))
            }
        })?;
    }
    Ok(container)
}

/// Parse the binding attributes of one field
pub fn parse_field_attrs(field: &Field) -> syn::Result<FieldAttrs> {
    let mut parsed = FieldAttrs::default();
    for attr in &field.attrs {
        if attr.path().is_ident("bind_to") {
            if parsed.bind_to.is_some() {
                return Err(syn::Error::new_spanned(attr, "duplicate bind_to attribute"));
            }
            parsed.bind_to = Some(attr.parse_args_with(parse_bind_to)?);
        } else if attr.path().is_ident("complex_bind") {
            parsed.complex_binds.push(parse_complex_bind(attr)?);
        } else if attr.path().is_ident("copy_ignore") {
            attr.meta.require_path_only()?;
            parsed.ignore = true;
        } else if attr.path().is_ident("converter") {
            let name: LitStr = attr.parse_args()?;
            parsed.converter = Some(name.value());
        }
    }
    Ok(parsed)
}

/// `"A, B"` optionally followed by `, literal`
fn parse_bind_to(input: ParseStream<'_>) -> syn::Result<(String, bool)> {
    let candidates: LitStr = input.parse()?;
    let mut literal = false;
    if input.peek(Token![,]) {
        input.parse::<Token![,]>()?;
        let flag: Ident = input.parse()?;
        if flag != "literal" {
            return Err(syn::Error::new(flag.span(), "expected `literal`"));
        }
        literal = true;
    }
    if !input.is_empty() {
        return Err(input.error("unexpected tokens after bind_to candidates"));
    }
    Ok((candidates.value(), literal))
}

fn parse_complex_bind(attr: &Attribute) -> syn::Result<ComplexBindAttr> {
    let mut dest = None;
    let mut source = None;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("dest") {
            let value: LitStr = meta.value()?.parse()?;
            dest = Some(value.value());
            Ok(())
        } else if meta.path.is_ident("source") {
            let value: LitStr = meta.value()?.parse()?;
            source = Some(value.value());
            Ok(())
        } else {
            Err(meta.error("unsupported complex_bind attribute"))
        }
    })?;

    let Some(source) = source else {
        return Err(syn::Error::new_spanned(attr, "complex_bind requires `source`"));
    };
    Ok(ComplexBindAttr {
        dest: dest.unwrap_or_default(),
        source,
    })
}
