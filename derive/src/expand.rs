use crate::record::{Field, FieldKind, Record};

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;

pub(crate) fn record(record: &Record) -> TokenStream {
    let ident = &record.ident;
    let mut generics = record.generics.clone();

    // Generic records need the capability bounds spelled out per field type.
    let params: Vec<syn::Ident> = generics.type_params().map(|p| p.ident.clone()).collect();
    if !params.is_empty() {
        let where_clause = generics.make_where_clause();
        for param in &params {
            where_clause.predicates.push(syn::parse_quote!(#param: 'static));
        }
        for field in &record.fields {
            let ty = &field.ty;
            match field.kind {
                FieldKind::Leaf => where_clause
                    .predicates
                    .push(syn::parse_quote!(#ty: ::db_record::Column)),
                FieldKind::Embedded => where_clause
                    .predicates
                    .push(syn::parse_quote!(#ty: ::db_record::Embedded)),
                FieldKind::Ignored => {}
            }
        }
    }

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let members = record.fields.iter().map(member);
    let slots = record.fields.iter().filter_map(slot);
    let slots_mut = record.fields.iter().filter_map(slot_mut);

    quote! {
        const _: () = {
            impl #impl_generics ::db_record::Record for #ident #ty_generics #where_clause {
                fn members() -> ::std::vec::Vec<::db_record::Member> {
                    ::std::vec![ #( #members, )* ]
                }
            }

            impl #impl_generics ::db_record::Reflect for #ident #ty_generics #where_clause {
                fn slot(&self, index: usize) -> ::std::option::Option<::db_record::Slot<'_>> {
                    match index {
                        #( #slots )*
                        _ => ::std::option::Option::None,
                    }
                }

                fn slot_mut(
                    &mut self,
                    index: usize,
                ) -> ::std::option::Option<::db_record::SlotMut<'_>> {
                    match index {
                        #( #slots_mut )*
                        _ => ::std::option::Option::None,
                    }
                }
            }

            impl #impl_generics ::db_record::Embedded for #ident #ty_generics #where_clause {
                fn type_name() -> &'static str {
                    ::std::any::type_name::<Self>()
                }

                fn members() -> ::std::vec::Vec<::db_record::Member> {
                    <Self as ::db_record::Record>::members()
                }

                fn as_reflect(&self) -> ::std::option::Option<&dyn ::db_record::Reflect> {
                    ::std::option::Option::Some(self)
                }

                fn as_reflect_mut(&mut self) -> &mut dyn ::db_record::Reflect {
                    self
                }
            }

            impl #impl_generics ::db_record::Element for #ident #ty_generics #where_clause {
                type Inner = Self;

                fn wrap(inner: Self) -> Self {
                    inner
                }
            }

            impl #impl_generics ::db_record::Element
                for ::std::boxed::Box<#ident #ty_generics> #where_clause
            {
                type Inner = #ident #ty_generics;

                fn wrap(inner: Self::Inner) -> Self {
                    ::std::boxed::Box::new(inner)
                }
            }
        };
    }
}

fn member(field: &Field) -> TokenStream {
    let name = field.ident.unraw().to_string();
    let ty = &field.ty;
    let tag = match &field.tag {
        Some(lit) => quote!(::std::option::Option::Some(#lit)),
        None => quote!(::std::option::Option::None),
    };

    match field.kind {
        FieldKind::Leaf => quote! {
            ::db_record::Member::leaf(#name, #tag, <#ty as ::db_record::Column>::kind())
        },
        FieldKind::Embedded => quote! {
            ::db_record::Member::embedded(
                #name,
                #tag,
                <#ty as ::db_record::Embedded>::type_name(),
                <#ty as ::db_record::Embedded>::members,
            )
        },
        FieldKind::Ignored => quote! {
            ::db_record::Member::ignored(#name, #tag)
        },
    }
}

fn slot(field: &Field) -> Option<TokenStream> {
    let index = field.index;
    let ident = &field.ident;

    match field.kind {
        FieldKind::Leaf => Some(quote! {
            #index => ::std::option::Option::Some(::db_record::Slot::Leaf(&self.#ident)),
        }),
        FieldKind::Embedded => Some(quote! {
            #index => ::std::option::Option::Some(::db_record::Slot::Branch(
                ::db_record::Embedded::as_reflect(&self.#ident),
            )),
        }),
        FieldKind::Ignored => None,
    }
}

fn slot_mut(field: &Field) -> Option<TokenStream> {
    let index = field.index;
    let ident = &field.ident;

    match field.kind {
        FieldKind::Leaf => Some(quote! {
            #index => ::std::option::Option::Some(::db_record::SlotMut::Leaf(&mut self.#ident)),
        }),
        FieldKind::Embedded => Some(quote! {
            #index => ::std::option::Option::Some(::db_record::SlotMut::Branch(
                ::db_record::Embedded::as_reflect_mut(&mut self.#ident),
            )),
        }),
        FieldKind::Ignored => None,
    }
}
