extern crate proc_macro;

mod expand;
mod record;

use proc_macro::TokenStream;

/// Derive `Record` for a struct with named fields.
///
/// Field attributes:
///
/// - `#[db("name,option,...")]` sets the column tag. `#[db("-")]` ignores the field.
/// - `#[db(embed)]` flattens a nested record (`T`, `Box<T>`, `Option<T>`, `Option<Box<T>>`).
#[proc_macro_derive(Record, attributes(db))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    match generate(input.into()) {
        Ok(output) => output.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn generate(input: proc_macro2::TokenStream) -> syn::Result<proc_macro2::TokenStream> {
    let item: syn::DeriveInput = syn::parse2(input)?;
    let record = record::Record::from_ast(&item)?;

    Ok(expand::record(&record))
}
