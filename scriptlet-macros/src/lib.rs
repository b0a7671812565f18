//! Build-time template compilation for `scriptlet`
//!
//! Each macro compiles templates while the crate using it is compiled and
//! expands to functions returning the finished `GeneratedScript`. Scan errors
//! become Rust compile errors pointing at the macro input. Include warnings are
//! kept on the script, as with runtime compilation.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use scriptlet_compiler::{
    Compiler, GeneratedScript, IncludeWarning, Location, Op, Options, Source, Statement,
};
use std::path::{Path, PathBuf};
use syn::{LitStr, Token, parse::Parse, parse::ParseStream, parse_macro_input};
use walkdir::WalkDir;

/// Extension of the template files picked up by `script_directory!`
static TEMPLATE_EXTENSION: &str = "tpl";

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            for lc in c.to_lowercase() {
                result.push(lc);
            }
        } else if c == '-' || c == '.' || c == ' ' {
            result.push('_');
        } else {
            result.push(c);
        }
    }
    result
}

fn manifest_dir() -> PathBuf {
    PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"))
}

/// Compiles a template, returning the script and the included files it
/// depends on
fn compile(
    source: Source,
    include_dir: &Path,
    reported_name: &str,
) -> Result<(GeneratedScript, Vec<PathBuf>), String> {
    let compiler = Compiler::new(Options {
        include_path: vec![include_dir.to_path_buf()],
        reported_name: Some(reported_name.to_string()),
    });
    compiler.compile_with_includes(source).map_err(|err| err.to_string())
}

fn quote_location(at: &Location) -> proc_macro2::TokenStream {
    let file: &str = &at.file;
    let line = at.line;
    quote! { ::scriptlet::Location::new(#file, #line) }
}

fn quote_statement(statement: &Statement) -> proc_macro2::TokenStream {
    let marker = quote_location(&statement.marker);
    let op = match &statement.op {
        Op::Write(text) => quote! { ::scriptlet::Op::Write(::std::string::String::from(#text)) },
        Op::Code(code) => quote! { ::scriptlet::Op::Code(::std::string::String::from(#code)) },
        Op::Interpolate { variable, style } => {
            let style = match style {
                Some(style) => quote! { ::std::option::Option::Some(::std::string::String::from(#style)) },
                None => quote! { ::std::option::Option::None },
            };
            quote! {
                ::scriptlet::Op::Interpolate {
                    variable: ::std::string::String::from(#variable),
                    style: #style,
                }
            }
        }
    };
    quote! { ::scriptlet::Statement { marker: #marker, op: #op } }
}

fn quote_warning(warning: &IncludeWarning) -> proc_macro2::TokenStream {
    match warning {
        IncludeWarning::NotFound { path, name, line } => quote! {
            ::scriptlet::IncludeWarning::NotFound {
                path: ::std::string::String::from(#path),
                name: ::std::string::String::from(#name),
                line: #line,
            }
        },
        IncludeWarning::Recursive { path, name, line } => quote! {
            ::scriptlet::IncludeWarning::Recursive {
                path: ::std::string::String::from(#path),
                name: ::std::string::String::from(#name),
                line: #line,
            }
        },
        IncludeWarning::Unreadable {
            path,
            name,
            line,
            reason,
        } => quote! {
            ::scriptlet::IncludeWarning::Unreadable {
                path: ::std::string::String::from(#path),
                name: ::std::string::String::from(#name),
                line: #line,
                reason: ::std::string::String::from(#reason),
            }
        },
    }
}

fn generate_code_for_script(
    fn_name: &str,
    script: &GeneratedScript,
    tracked: &[PathBuf],
) -> proc_macro2::TokenStream {
    let method_name = format_ident!("{}", to_snake_case(fn_name));
    let name = script.name();
    let statements = script.statements().iter().map(quote_statement);
    let warnings = script.warnings().iter().map(quote_warning);

    let include_bytes_stmts = tracked.iter().map(|path| {
        let path_str = path.to_string_lossy();
        quote! {
            const _: &[u8] = include_bytes!(#path_str);
        }
    });

    quote! {
        // ensure the compiler is aware the output is linked to the template and its includes so
        // that any changes to those files will trigger a recompilation
        #(#include_bytes_stmts)*

        pub fn #method_name() -> ::scriptlet::GeneratedScript {
            ::scriptlet::GeneratedScript::from_parts(
                #name,
                ::std::vec![#(#statements),*],
                ::std::vec![#(#warnings),*],
            )
        }
    }
}

fn generate_code_for_file(path: &Path, reported_name: &str) -> Result<proc_macro2::TokenStream, String> {
    let file_stem = path
        .file_stem()
        .ok_or_else(|| format!("Not a file: {:?}", path))?
        .to_string_lossy()
        .into_owned();
    let include_dir = path.parent().unwrap_or(path);
    let (script, included) = compile(Source::File(path.to_path_buf()), include_dir, reported_name)?;
    let tracked: Vec<PathBuf> = std::iter::once(path.to_path_buf()).chain(included).collect();
    Ok(generate_code_for_script(&file_stem, &script, &tracked))
}

struct StrInput {
    name: LitStr,
    content: LitStr,
}

impl Parse for StrInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name: LitStr = input.parse()?;
        input.parse::<Token![,]>()?;
        let content: LitStr = input.parse()?;
        Ok(StrInput { name, content })
    }
}

/// Compiles every `.tpl` file under a directory, relative to the crate root,
/// into one function per file named after the file stem
#[proc_macro]
pub fn script_directory(input: TokenStream) -> TokenStream {
    let dir_lit = parse_macro_input!(input as LitStr);
    let dir_str = dir_lit.value();

    let manifest_dir = manifest_dir();
    let root_path = manifest_dir.join(&dir_str);

    if !root_path.exists() {
        return syn::Error::new(
            dir_lit.span(),
            format!("Directory not found: {:?}", root_path),
        )
        .to_compile_error()
        .into();
    }

    let mut functions = Vec::new();

    for entry in WalkDir::new(&root_path) {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION) {
            let reported_name = path
                .strip_prefix(&manifest_dir)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned();
            match generate_code_for_file(path, &reported_name) {
                Ok(function) => functions.push(function),
                Err(message) => return syn::Error::new(dir_lit.span(), message).to_compile_error().into(),
            }
        }
    }

    let expanded = quote! {
        #(#functions)*
    };

    TokenStream::from(expanded)
}

/// Compiles one template file, relative to the crate root
#[proc_macro]
pub fn script_file(input: TokenStream) -> TokenStream {
    let file_lit = parse_macro_input!(input as LitStr);
    let file_str = file_lit.value();

    let path = manifest_dir().join(&file_str);

    if !path.exists() {
        return syn::Error::new(file_lit.span(), format!("File not found: {:?}", path))
            .to_compile_error()
            .into();
    }

    match generate_code_for_file(&path, &file_str) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(message) => syn::Error::new(file_lit.span(), message).to_compile_error().into(),
    }
}

/// Compiles template text given inline; includes resolve against the crate root
#[proc_macro]
pub fn script_str(input: TokenStream) -> TokenStream {
    let StrInput { name, content } = parse_macro_input!(input as StrInput);
    let fn_name = name.value();
    let (script, included) = match compile(Source::Text(content.value()), &manifest_dir(), &fn_name) {
        Ok(compiled) => compiled,
        Err(message) => return syn::Error::new(content.span(), message).to_compile_error().into(),
    };

    TokenStream::from(generate_code_for_script(&fn_name, &script, &included))
}
