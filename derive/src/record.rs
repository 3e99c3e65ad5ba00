use syn::parse::ParseStream;

#[derive(Debug)]
pub(crate) struct Record {
    /// Struct identifier
    pub(crate) ident: syn::Ident,

    /// Struct generics, carried into every generated impl
    pub(crate) generics: syn::Generics,

    /// Fields in declaration order
    pub(crate) fields: Vec<Field>,
}

#[derive(Debug)]
pub(crate) struct Field {
    /// Index of the field in the struct
    pub(crate) index: usize,

    pub(crate) ident: syn::Ident,

    pub(crate) ty: syn::Type,

    /// Raw tag text from `#[db("...")]`
    pub(crate) tag: Option<syn::LitStr>,

    pub(crate) kind: FieldKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Leaf,
    Embedded,
    Ignored,
}

#[derive(Debug)]
struct ErrorSet {
    errors: Vec<syn::Error>,
}

impl ErrorSet {
    fn new() -> Self {
        Self { errors: vec![] }
    }

    fn push(&mut self, err: syn::Error) {
        self.errors.push(err);
    }

    fn collect(self) -> Option<syn::Error> {
        self.errors.into_iter().reduce(|mut acc, err| {
            acc.combine(err);
            acc
        })
    }
}

enum DbAttr {
    Tag(syn::LitStr),
    Embed,
}

impl Record {
    pub(crate) fn from_ast(item: &syn::DeriveInput) -> syn::Result<Self> {
        let syn::Data::Struct(data) = &item.data else {
            return Err(syn::Error::new_spanned(
                &item.ident,
                "Record can only be derived for structs",
            ));
        };

        let syn::Fields::Named(named) = &data.fields else {
            return Err(syn::Error::new_spanned(
                &data.fields,
                "Record fields must be named",
            ));
        };

        let mut errs = ErrorSet::new();
        let mut fields = vec![];

        for (index, field) in named.named.iter().enumerate() {
            match Field::from_ast(field, index) {
                Ok(field) => fields.push(field),
                Err(err) => errs.push(err),
            }
        }

        if let Some(err) = errs.collect() {
            return Err(err);
        }

        Ok(Self {
            ident: item.ident.clone(),
            generics: item.generics.clone(),
            fields,
        })
    }
}

impl Field {
    fn from_ast(field: &syn::Field, index: usize) -> syn::Result<Self> {
        let Some(ident) = &field.ident else {
            return Err(syn::Error::new_spanned(field, "Record fields must be named"));
        };

        let mut errs = ErrorSet::new();
        let mut tag = None;
        let mut embed = false;

        for attr in &field.attrs {
            if !attr.path().is_ident("db") {
                continue;
            }

            match attr.parse_args_with(parse_db_attr)? {
                DbAttr::Tag(lit) => {
                    if tag.is_some() {
                        errs.push(syn::Error::new_spanned(attr, "duplicate #[db(\"...\")] tag"));
                    } else {
                        tag = Some(lit);
                    }
                }
                DbAttr::Embed => {
                    if embed {
                        errs.push(syn::Error::new_spanned(attr, "duplicate #[db(embed)]"));
                    } else {
                        embed = true;
                    }
                }
            }
        }

        if let Some(err) = errs.collect() {
            return Err(err);
        }

        let ignored = tag
            .as_ref()
            .is_some_and(|lit| lit.value().split(',').next().map(str::trim) == Some("-"));

        let kind = match (ignored, embed) {
            (true, _) => FieldKind::Ignored,
            (false, true) => FieldKind::Embedded,
            (false, false) => FieldKind::Leaf,
        };

        Ok(Self {
            index,
            ident: ident.clone(),
            ty: field.ty.clone(),
            tag,
            kind,
        })
    }
}

fn parse_db_attr(input: ParseStream<'_>) -> syn::Result<DbAttr> {
    if input.peek(syn::LitStr) {
        return Ok(DbAttr::Tag(input.parse()?));
    }

    let ident: syn::Ident = input.parse()?;
    if ident == "embed" {
        Ok(DbAttr::Embed)
    } else {
        Err(syn::Error::new_spanned(
            ident,
            "expected a tag string or `embed`",
        ))
    }
}
