//! Program entry function.
//!
//! `main` runs before any managed code exists: it sizes the heap, stamps
//! pre-baked headers into the static metadata and string-pool objects so
//! the collector can traverse them, runs eligible static initializers in
//! resolved class order, and hands control to the designated entry method.

use crate::error::{Error, Result};
use crate::model::{MethodSignature, ValueType, well_known};

use super::context::GenerationContext;
use super::names;
use super::writer::CodeWriter;

pub(crate) fn emit_entry_function(
    ctx: &GenerationContext<'_>,
    w: &mut CodeWriter<'_>,
    entry: &MethodSignature,
    min_heap_size: u64,
) -> Result<()> {
    let Ok(entry_symbol) = ctx.names.for_method(entry) else {
        return Err(Error::codegen(format!(
            "entry method {entry} has no emitted definition"
        )));
    };

    let class_metadata = ValueType::object(well_known::CLASS);
    let stamp_classes = ctx.collected.contains(&class_metadata);
    let string_metadata = ValueType::object(well_known::STRING);
    let stamp_strings = !ctx.pool.is_empty() && ctx.collected.contains(&string_metadata);

    w.println("int main(int argc, char** argv) {");
    w.indent();
    if stamp_classes {
        w.println("int32_t oolong_class_header;");
    }
    if stamp_strings {
        w.println("int32_t oolong_string_header;");
        w.println("int32_t i;");
    }
    w.println("(void) argc;");
    w.println("(void) argv;");
    w.write(names::RT_INIT_HEAP)
        .write("(INT64_C(")
        .write(&min_heap_size.to_string())
        .println("));");

    // Headers first: a static initializer may allocate, and allocation must
    // never observe an unstamped metadata object.
    if stamp_classes {
        w.write("oolong_class_header = ")
            .write(names::PACK_CLASS_MACRO)
            .write("(&")
            .write(ctx.names.for_metadata(&class_metadata)?)
            .write(") | ")
            .write(names::GC_MARKED_MACRO)
            .println(";");
        for ty in ctx.collected.types() {
            if !ctx.traits.needs_virtual_table(ty) {
                continue;
            }
            w.write(&ctx.metadata_header_lvalue(ty)?)
                .println(" = oolong_class_header;");
        }
    }
    if stamp_strings {
        w.write("oolong_string_header = ")
            .write(names::PACK_CLASS_MACRO)
            .write("(&")
            .write(ctx.names.for_metadata(&string_metadata)?)
            .write(") | ")
            .write(names::GC_MARKED_MACRO)
            .println(";");
        w.write("for (i = 0; i < ")
            .write(&ctx.pool.len().to_string())
            .println("; ++i) {");
        w.indent();
        w.write(names::STRING_POOL)
            .println("[i].object.header = oolong_string_header;");
        w.outdent();
        w.println("}");
    }

    for name in ctx.order.names() {
        let Some(class) = ctx.program.get(name) else {
            continue;
        };
        if !class.eager_init && !ctx.traits.is_plain_data(name) {
            continue;
        }
        let initializer = class.methods.iter().find(|method| {
            method.is_static && method.name == well_known::CLINIT && method.has_body()
        });
        let Some(initializer) = initializer else {
            continue;
        };
        w.write(ctx.names.for_method(&class.signature_of(initializer))?)
            .println("();");
    }

    let args: Vec<&str> = entry
        .descriptor
        .params
        .iter()
        .map(|ty| if ty.is_reference() { "NULL" } else { "0" })
        .collect();
    w.write(entry_symbol)
        .write("(")
        .write(&args.join(", "))
        .println(");");
    w.println("return 0;");
    w.outdent();
    w.println("}");
    Ok(())
}
