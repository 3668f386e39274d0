//! Class-derived sections of the emitted unit.
//!
//! Each generator writes one section through the buffered writer; nothing
//! reaches the sink until the orchestrator flushes. Declaration-before-use
//! is positional: forward typedefs and the prototype backfill fragment come
//! first, data tables before the entry function that stamps them.

use crate::error::{Error, Result};
use crate::model::{MethodKey, ValueType, well_known};

use super::context::{
    GenerationContext, MetadataShape, StructEmbed, element_size_expr, primitive_c_type,
};
use super::names;
use super::writer::{CodeBuffer, CodeWriter, FragmentId};
use super::{BodyContext, MethodBodySource};

/// One `typedef struct oc_X oc_X;` per class, in resolved class order, so
/// every later section can name any class type.
pub(crate) fn emit_forward_typedefs(
    ctx: &GenerationContext<'_>,
    w: &mut CodeWriter<'_>,
) -> Result<()> {
    for name in ctx.order.names() {
        let strukt = ctx.names.for_class(name)?;
        w.write("typedef struct ")
            .write(strukt)
            .write(" ")
            .write(strukt)
            .println(";");
    }
    if !ctx.order.is_empty() {
        w.newline();
    }
    Ok(())
}

/// Struct definitions in resolved class order, each followed by the storage
/// for the class's static fields. Superclass data embeds by value at offset
/// zero, so ancestor field offsets hold in every descendant.
pub(crate) fn emit_class_structs(
    ctx: &GenerationContext<'_>,
    w: &mut CodeWriter<'_>,
) -> Result<()> {
    for name in ctx.order.names() {
        let Some(class) = ctx.program.get(name) else {
            continue;
        };
        let plan = ctx.struct_plan(class)?;
        w.write("struct ").write(ctx.names.for_class(name)?).println(" {");
        w.indent();
        match plan.embed {
            StructEmbed::RuntimeObject => {
                w.write(names::RT_OBJECT).println(" parent;");
            }
            StructEmbed::Class(parent) => {
                w.write(parent).println(" parent;");
            }
            StructEmbed::None => {}
        }
        for (member, field) in &plan.members {
            w.write(&ctx.c_type_of(&field.ty)?)
                .write(" ")
                .write(member)
                .println(";");
        }
        // C forbids empty structs; only plain-data roots can end up with
        // no members at all.
        if matches!(plan.embed, StructEmbed::None) && plan.members.is_empty() {
            w.println("char padding;");
        }
        w.outdent();
        w.println("};");
        w.newline();

        let mut any_static = false;
        for field in &class.fields {
            if !field.is_static {
                continue;
            }
            w.write("static ")
                .write(&ctx.c_type_of(&field.ty)?)
                .write(" ")
                .write(ctx.names.for_static_field(name, &field.name)?)
                .println(";");
            any_static = true;
        }
        if any_static {
            w.newline();
        }
    }
    Ok(())
}

/// Virtual-table struct per dispatching class: the metadata record first,
/// then one function-pointer member per slot. Slot offsets are shared down
/// the subtree, so the members repeat inherited slots before own ones.
pub(crate) fn emit_vtable_structs(
    ctx: &GenerationContext<'_>,
    w: &mut CodeWriter<'_>,
) -> Result<()> {
    for ty in ctx.collected.types() {
        let ValueType::Object(name) = ty else {
            continue;
        };
        if !ctx.traits.needs_virtual_table(ty) {
            continue;
        }
        let vt = ctx.names.for_vtable_struct(name)?;
        w.write("typedef struct ").write(vt).println(" {");
        w.indent();
        w.write(names::RT_CLASS).println(" base;");
        if let Some(table) = ctx.vtables.table_of(name) {
            for slot in &table.slots {
                w.write(&ctx.c_return_type_of(slot.key.descriptor.ret.as_ref())?)
                    .write(" (*")
                    .write(&slot.field)
                    .write(")(")
                    .write(&slot_parameter_list(ctx, &slot.key)?)
                    .println(");");
            }
        }
        w.outdent();
        w.write("} ").write(vt).println(";");
        w.newline();
    }
    Ok(())
}

/// Receiver first, then the declared parameters. The receiver is untyped in
/// slots so one table struct serves the whole subtree; call sites cast.
fn slot_parameter_list(ctx: &GenerationContext<'_>, key: &MethodKey) -> Result<String> {
    let mut params = vec!["void*".to_owned()];
    for ty in &key.descriptor.params {
        params.push(ctx.c_type_of(ty)?);
    }
    Ok(params.join(", "))
}

/// Per-class reference-field offset tables plus the order-indexed pointer
/// array the collector walks. A class with no reference fields gets a null
/// entry instead of an empty table.
pub(crate) fn emit_layout_tables(
    ctx: &GenerationContext<'_>,
    w: &mut CodeWriter<'_>,
) -> Result<()> {
    let mut entries: Vec<Option<&str>> = Vec::new();
    let mut emitted_any = false;
    for name in ctx.order.names() {
        let rows = layout_rows(ctx, name)?;
        if rows.is_empty() {
            entries.push(None);
            continue;
        }
        let symbol = ctx.names.for_layout(name)?;
        w.write("static const int16_t ").write(symbol).println("[] = {");
        w.indent();
        w.write(&rows.len().to_string()).println(",");
        for row in &rows {
            w.write(row).println(",");
        }
        w.outdent();
        w.println("};");
        entries.push(Some(symbol));
        emitted_any = true;
    }
    if emitted_any {
        w.newline();
    }

    w.write("static const int16_t* const ")
        .write(names::CLASS_LAYOUTS)
        .write("[")
        .write(&entries.len().max(1).to_string())
        .println("] = {");
    w.indent();
    if entries.is_empty() {
        w.println("NULL,");
    }
    for entry in &entries {
        match entry {
            Some(symbol) => {
                w.write(symbol).println(",");
            }
            None => {
                w.println("NULL,");
            }
        }
    }
    w.outdent();
    w.println("};");
    w.write("static const int32_t ")
        .write(names::CLASS_COUNT)
        .write(" = ")
        .write(&entries.len().to_string())
        .println(";");
    w.newline();
    Ok(())
}

/// Offsets of every traced field along the embed chain, ancestors first.
/// `offsetof` goes through the declaring struct; embedding at offset zero
/// makes that offset hold in the concrete class too.
fn layout_rows(ctx: &GenerationContext<'_>, class: &str) -> Result<Vec<String>> {
    if ctx.traits.is_plain_data(class) {
        return Ok(Vec::new());
    }
    let mut chain = Vec::new();
    let mut current = ctx.program.get(class);
    while let Some(decl) = current {
        let plan = ctx.struct_plan(decl)?;
        current = match plan.embed {
            StructEmbed::Class(_) => decl
                .superclass
                .as_deref()
                .and_then(|parent| ctx.program.get(parent)),
            _ => None,
        };
        chain.push((decl, plan));
    }
    let mut rows = Vec::new();
    for (decl, plan) in chain.iter().rev() {
        let strukt = ctx.names.for_class(&decl.name)?;
        for (member, field) in &plan.members {
            if ctx.is_traced_reference(&field.ty) {
                rows.push(format!("(int16_t) offsetof({strukt}, {member})"));
            }
        }
    }
    Ok(rows)
}

/// Tentative declarations for every metadata instance and type-check
/// helper, so definitions can reference each other freely.
pub(crate) fn emit_metadata_forward_decls(
    ctx: &GenerationContext<'_>,
    w: &mut CodeWriter<'_>,
) -> Result<()> {
    for ty in ctx.collected.types() {
        let record = match ctx.metadata_shape(ty)? {
            MetadataShape::VTable(vt) => vt,
            MetadataShape::Bare => names::RT_CLASS,
        };
        w.write("static ")
            .write(record)
            .write(" ")
            .write(ctx.names.for_metadata(ty)?)
            .println(";");
    }
    for ty in ctx.collected.types() {
        w.write("static int32_t ")
            .write(ctx.names.for_supertype_helper(ty)?)
            .write("(")
            .write(names::RT_CLASS)
            .println("*);");
    }
    if !ctx.collected.is_empty() {
        w.newline();
    }
    Ok(())
}

/// Metadata instance definitions in collected order. Dispatching classes
/// and arrays are table-shaped with the record embedded first; arrays fill
/// their slots from the root class's resolved implementations.
pub(crate) fn emit_metadata_definitions(
    ctx: &GenerationContext<'_>,
    w: &mut CodeWriter<'_>,
) -> Result<()> {
    for ty in ctx.collected.types() {
        let shape = ctx.metadata_shape(ty)?;
        let record = match shape {
            MetadataShape::VTable(vt) => vt,
            MetadataShape::Bare => names::RT_CLASS,
        };
        w.write("static ")
            .write(record)
            .write(" ")
            .write(ctx.names.for_metadata(ty)?)
            .println(" = {");
        w.indent();
        match shape {
            MetadataShape::VTable(_) => {
                w.println(".base = {");
                w.indent();
                emit_metadata_record_fields(ctx, w, ty)?;
                w.outdent();
                w.println("},");
                emit_vtable_slot_initializers(ctx, w, ty)?;
            }
            MetadataShape::Bare => {
                emit_metadata_record_fields(ctx, w, ty)?;
            }
        }
        w.outdent();
        w.println("};");
        w.newline();
    }
    Ok(())
}

fn emit_metadata_record_fields(
    ctx: &GenerationContext<'_>,
    w: &mut CodeWriter<'_>,
    ty: &ValueType,
) -> Result<()> {
    w.println(".object = { 0 },");

    let size = match ty {
        ValueType::Object(name) => format!("sizeof({})", ctx.names.for_class(name)?),
        // Arrays carry their element width; the allocator multiplies.
        ValueType::Array(item) => element_size_expr(item),
        ValueType::Primitive(kind) => format!("sizeof({})", primitive_c_type(*kind)),
    };
    w.write(".size = ").write(&size).println(",");

    let flags = match ty {
        ValueType::Object(_) => "0",
        ValueType::Array(_) => "OOLONG_CLASS_ARRAY",
        ValueType::Primitive(_) => "OOLONG_CLASS_PRIMITIVE",
    };
    w.write(".flags = ").write(flags).println(",");

    let tag = match ty {
        ValueType::Object(name) => ctx.tags.tag_of(name),
        _ => None,
    };
    let (tag, upper) = tag.map_or((0, 0), |tag| (tag.tag, tag.upper));
    w.write(".tag = ").write(&tag.to_string()).println(",");
    w.write(".upper_tag = ").write(&upper.to_string()).println(",");

    let order = match ty {
        ValueType::Object(name) => ctx
            .order
            .position_of(name)
            .map_or(-1, |position| position as i64),
        _ => -1,
    };
    w.write(".order = ").write(&order.to_string()).println(",");

    let name_index = ctx.pool.index_of(&ty.runtime_name()).ok_or_else(|| {
        Error::internal(format!("runtime name of {ty} missing from the string pool"))
    })?;
    w.write(".name = &")
        .write(names::STRING_POOL)
        .write("[")
        .write(&name_index.to_string())
        .println("],");

    match ty {
        ValueType::Array(item) if ctx.collected.contains(item) => {
            w.write(".item_type = (")
                .write(names::RT_CLASS)
                .write("*) &")
                .write(ctx.names.for_metadata(item)?)
                .println(",");
        }
        _ => {
            w.println(".item_type = NULL,");
        }
    }

    w.write(".is_supertype = &")
        .write(ctx.names.for_supertype_helper(ty)?)
        .println(",");
    Ok(())
}

fn emit_vtable_slot_initializers(
    ctx: &GenerationContext<'_>,
    w: &mut CodeWriter<'_>,
    ty: &ValueType,
) -> Result<()> {
    let dispatch = match ty {
        ValueType::Object(name) => name.as_str(),
        _ => well_known::OBJECT,
    };
    let Some(table) = ctx.vtables.table_of(dispatch) else {
        return Ok(());
    };
    for slot in &table.slots {
        match slot.implementation.as_ref() {
            Some(implementation) => {
                w.write(".")
                    .write(&slot.field)
                    .write(" = (")
                    .write(&ctx.c_return_type_of(slot.key.descriptor.ret.as_ref())?)
                    .write(" (*)(")
                    .write(&slot_parameter_list(ctx, &slot.key)?)
                    .write(")) &")
                    .write(ctx.names.for_method(implementation)?)
                    .println(",");
            }
            None => {
                w.write(".").write(&slot.field).println(" = NULL,");
            }
        }
    }
    Ok(())
}

/// One type-check helper per collected type: tag-range membership for
/// classes, item-type recursion for arrays, identity for primitives. The
/// hierarchy root accepts everything.
pub(crate) fn emit_supertype_helpers(
    ctx: &GenerationContext<'_>,
    w: &mut CodeWriter<'_>,
) -> Result<()> {
    for ty in ctx.collected.types() {
        w.write("static int32_t ")
            .write(ctx.names.for_supertype_helper(ty)?)
            .write("(")
            .write(names::RT_CLASS)
            .println("* cls) {");
        w.indent();
        match ty {
            ValueType::Object(name) if name.as_str() == well_known::OBJECT => {
                w.println("(void) cls;");
                w.println("return 1;");
            }
            ValueType::Object(name) => match ctx.tags.tag_of(name) {
                Some(tag) if tag.tag == tag.upper => {
                    w.write("return cls->tag == ")
                        .write(&tag.tag.to_string())
                        .println(";");
                }
                Some(tag) => {
                    w.write("return cls->tag >= ")
                        .write(&tag.tag.to_string())
                        .write(" && cls->tag <= ")
                        .write(&tag.upper.to_string())
                        .println(";");
                }
                None => {
                    w.println("(void) cls;");
                    w.println("return 0;");
                }
            },
            ValueType::Array(item) => {
                w.println("if (!(cls->flags & OOLONG_CLASS_ARRAY) || cls->item_type == NULL) {");
                w.indent();
                w.println("return 0;");
                w.outdent();
                w.println("}");
                w.write("return ")
                    .write(ctx.names.for_supertype_helper(item)?)
                    .println("(cls->item_type);");
            }
            ValueType::Primitive(_) => {
                w.write("return cls == &")
                    .write(ctx.names.for_metadata(ty)?)
                    .println(";");
            }
        }
        w.outdent();
        w.println("}");
        w.newline();
    }
    Ok(())
}

/// Addresses of every static reference field, in class-table order, plus
/// the count the collector iterates with. An empty program still defines
/// the array with a single null sentinel so the symbol resolves.
pub(crate) fn emit_gc_roots(ctx: &GenerationContext<'_>, w: &mut CodeWriter<'_>) -> Result<()> {
    let mut roots = Vec::new();
    for class in ctx.program {
        for field in &class.fields {
            if field.is_static && ctx.is_traced_reference(&field.ty) {
                roots.push(ctx.names.for_static_field(&class.name, &field.name)?);
            }
        }
    }
    w.write("static void** ")
        .write(names::GC_ROOTS)
        .write("[")
        .write(&roots.len().max(1).to_string())
        .println("] = {");
    w.indent();
    if roots.is_empty() {
        w.println("NULL,");
    }
    for root in &roots {
        w.write("(void**) &").write(root).println(",");
    }
    w.outdent();
    w.println("};");
    w.write("static const int32_t ")
        .write(names::GC_ROOTS_COUNT)
        .write(" = ")
        .write(&roots.len().to_string())
        .println(";");
    w.newline();
    Ok(())
}

/// Full method definitions in class-table order. The body itself comes from
/// the external lowering collaborator; this generator owns the signature,
/// the receiver, the braces, and the two fragments the collaborator fills:
/// hoisted local declarations and the statement stream. Each definition
/// backfills a `static` prototype into the declarations fragment, so
/// earlier sections and other bodies can reference any method.
pub(crate) fn emit_method_bodies(
    ctx: &GenerationContext<'_>,
    buf: &mut CodeBuffer,
    root: FragmentId,
    protos: FragmentId,
    bodies: &mut dyn MethodBodySource,
) -> Result<()> {
    let body_ctx = BodyContext {
        names: ctx.names,
        pool: ctx.pool,
        vtables: ctx.vtables,
    };
    for class in ctx.program {
        for method in &class.methods {
            if !method.has_body() {
                continue;
            }
            let signature = class.signature_of(method);
            let symbol = ctx.names.for_method(&signature)?;
            let ret = ctx.c_return_type_of(method.descriptor.ret.as_ref())?;

            let mut params = Vec::new();
            let mut proto_params = Vec::new();
            if !method.is_static {
                let receiver = format!("{}*", ctx.names.for_class(&class.name)?);
                params.push(format!("{receiver} self"));
                proto_params.push(receiver);
            }
            for (index, ty) in method.descriptor.params.iter().enumerate() {
                let c_type = ctx.c_type_of(ty)?;
                params.push(format!("{c_type} p{index}"));
                proto_params.push(c_type);
            }
            let params = join_or_void(params);
            let proto_params = join_or_void(proto_params);

            buf.writer(protos)
                .write("static ")
                .write(&ret)
                .write(" ")
                .write(symbol)
                .write("(")
                .write(&proto_params)
                .println(");");

            let (locals, body) = {
                let mut w = buf.writer(root);
                w.write("static ")
                    .write(&ret)
                    .write(" ")
                    .write(symbol)
                    .write("(")
                    .write(&params)
                    .println(") {");
                w.indent();
                let locals = w.fragment();
                let body = w.fragment();
                w.outdent();
                w.println("}");
                w.newline();
                (locals, body)
            };
            bodies.emit_body(class, method, &body_ctx, buf, body, locals)?;
        }
    }
    Ok(())
}

fn join_or_void(params: Vec<String>) -> String {
    if params.is_empty() {
        "void".to_owned()
    } else {
        params.join(", ")
    }
}

/// Cast-failure trampoline. Typed `void*` so lowered cast expressions can
/// splice it into any reference context; the runtime entry point it calls
/// does not return.
pub(crate) fn emit_cast_failure_helper(buf: &mut CodeBuffer, root: FragmentId, protos: FragmentId) {
    buf.writer(protos)
        .write("static void* ")
        .write(names::THROW_CCE)
        .println("(void);");
    let mut w = buf.writer(root);
    w.write("static void* ").write(names::THROW_CCE).println("(void) {");
    w.indent();
    w.write(names::RT_THROW_CAST_ERROR).println("();");
    w.println("return NULL;");
    w.outdent();
    w.println("}");
    w.newline();
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::super::context::fixtures::Fixture;
    use super::*;
    use crate::model::{
        ClassTable, FieldDecl, InvokeKind, Instruction, ManagedClass, MethodBody, MethodDecl,
        MethodDescriptor, MethodSignature, PrimitiveKind,
    };

    fn int() -> ValueType {
        ValueType::Primitive(PrimitiveKind::Int)
    }

    fn sample() -> ClassTable {
        let mut program = ClassTable::new();
        program.push(
            ManagedClass::new(well_known::OBJECT, None).with_method(MethodDecl::instance(
                "hash",
                MethodDescriptor::new(vec![], Some(int())),
                Some(MethodBody::default()),
            )),
        );
        program.push(
            ManagedClass::new("app.Point", Some(well_known::OBJECT))
                .with_field(FieldDecl::instance("x", int()))
                .with_field(FieldDecl::instance("next", ValueType::object("app.Point")))
                .with_field(FieldDecl::of_static("origin", ValueType::object("app.Point")))
                .with_method(MethodDecl::instance(
                    "touch",
                    MethodDescriptor::new(vec![], None),
                    Some(MethodBody::of_instructions(vec![Instruction::Invoke {
                        kind: InvokeKind::Virtual,
                        target: MethodSignature::new(
                            well_known::OBJECT,
                            "hash",
                            MethodDescriptor::new(vec![], Some(int())),
                        ),
                    }])),
                ))
                .with_method(MethodDecl::of_static(
                    "make",
                    MethodDescriptor::new(vec![int()], Some(ValueType::object("app.Point"))),
                    Some(MethodBody::default()),
                )),
        );
        program
    }

    fn render(emit: impl FnOnce(&GenerationContext<'_>, &mut CodeWriter<'_>) -> Result<()>) -> String {
        let fixture = Fixture::new(sample());
        let ctx = fixture.ctx();
        let mut buf = CodeBuffer::new();
        let root = buf.root();
        emit(&ctx, &mut buf.writer(root)).unwrap();
        let mut out = Vec::new();
        buf.flush(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn structs_embed_parents_and_keep_static_storage_beside_them() {
        let text = render(emit_class_structs);
        expect![[r#"
            struct oc_core_Object {
                OolongObject parent;
            };

            struct oc_app_Point {
                oc_core_Object parent;
                int32_t x;
                oc_app_Point* next;
            };

            static oc_app_Point* os_app_Point_origin;

        "#]]
        .assert_eq(&text);
    }

    #[test]
    fn vtable_structs_repeat_inherited_slots() {
        let text = render(emit_vtable_structs);
        expect![[r#"
            typedef struct oc_core_Object_vt {
                OolongClass base;
                int32_t (*hash)(void*);
            } oc_core_Object_vt;

            typedef struct oc_app_Point_vt {
                OolongClass base;
                int32_t (*hash)(void*);
            } oc_app_Point_vt;

        "#]]
        .assert_eq(&text);
    }

    #[test]
    fn layout_tables_index_by_class_order_with_null_for_fieldless_classes() {
        let text = render(emit_layout_tables);
        expect![[r#"
            static const int16_t oc_app_Point_layout[] = {
                1,
                (int16_t) offsetof(oc_app_Point, next),
            };

            static const int16_t* const oolong_class_layouts[2] = {
                NULL,
                oc_app_Point_layout,
            };
            static const int32_t oolong_class_count = 2;

        "#]]
        .assert_eq(&text);
    }

    #[test]
    fn metadata_definitions_nest_the_record_and_cast_slot_pointers() {
        let text = render(emit_metadata_definitions);
        expect![[r#"
            static oc_core_Object_vt ocls_core_Object = {
                .base = {
                    .object = { 0 },
                    .size = sizeof(oc_core_Object),
                    .flags = 0,
                    .tag = 1,
                    .upper_tag = 2,
                    .order = 0,
                    .name = &oolong_string_pool[0],
                    .item_type = NULL,
                    .is_supertype = &osup_core_Object,
                },
                .hash = (int32_t (*)(void*)) &oc_core_Object_hash,
            };

            static oc_app_Point_vt ocls_app_Point = {
                .base = {
                    .object = { 0 },
                    .size = sizeof(oc_app_Point),
                    .flags = 0,
                    .tag = 2,
                    .upper_tag = 2,
                    .order = 1,
                    .name = &oolong_string_pool[1],
                    .item_type = NULL,
                    .is_supertype = &osup_app_Point,
                },
                .hash = (int32_t (*)(void*)) &oc_core_Object_hash,
            };

        "#]]
        .assert_eq(&text);
    }

    #[test]
    fn forward_decls_cover_instances_and_helpers() {
        let text = render(emit_metadata_forward_decls);
        expect![[r#"
            static oc_core_Object_vt ocls_core_Object;
            static oc_app_Point_vt ocls_app_Point;
            static int32_t osup_core_Object(OolongClass*);
            static int32_t osup_app_Point(OolongClass*);

        "#]]
        .assert_eq(&text);
    }

    #[test]
    fn root_helper_accepts_everything_and_leaves_compare_by_tag() {
        let text = render(emit_supertype_helpers);
        assert!(text.contains("static int32_t osup_core_Object(OolongClass* cls) {\n    (void) cls;\n    return 1;\n}"));
        assert!(text.contains("return cls->tag == 2;"));
    }

    #[test]
    fn array_helpers_recurse_and_primitive_helpers_compare_identity() {
        let mut program = sample();
        program.push(
            ManagedClass::new("app.Main", Some(well_known::OBJECT)).with_method(
                MethodDecl::of_static(
                    "main",
                    MethodDescriptor::new(vec![], None),
                    Some(MethodBody::of_instructions(vec![Instruction::ClassConstant {
                        ty: ValueType::array_of(int()),
                    }])),
                ),
            ),
        );
        let fixture = Fixture::new(program);
        let ctx = fixture.ctx();
        let mut buf = CodeBuffer::new();
        let root = buf.root();
        emit_supertype_helpers(&ctx, &mut buf.writer(root)).unwrap();
        emit_metadata_definitions(&ctx, &mut buf.writer(root)).unwrap();
        let mut out = Vec::new();
        buf.flush(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("return cls == &ocls_int;"));
        assert!(text.contains("if (!(cls->flags & OOLONG_CLASS_ARRAY) || cls->item_type == NULL) {"));
        assert!(text.contains("return osup_int(cls->item_type);"));
        assert!(text.contains(".flags = OOLONG_CLASS_ARRAY,"));
        assert!(text.contains(".size = sizeof(int32_t),"));
        assert!(text.contains(".item_type = (OolongClass*) &ocls_int,"));
    }

    #[test]
    fn gc_roots_list_static_reference_fields_only() {
        let text = render(emit_gc_roots);
        expect![[r#"
            static void** oolong_gc_roots[1] = {
                (void**) &os_app_Point_origin,
            };
            static const int32_t oolong_gc_roots_count = 1;

        "#]]
        .assert_eq(&text);
    }

    #[test]
    fn empty_program_still_defines_root_and_layout_symbols() {
        let fixture = Fixture::new(ClassTable::new());
        let ctx = fixture.ctx();
        let mut buf = CodeBuffer::new();
        let root = buf.root();
        emit_layout_tables(&ctx, &mut buf.writer(root)).unwrap();
        emit_gc_roots(&ctx, &mut buf.writer(root)).unwrap();
        let mut out = Vec::new();
        buf.flush(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("static const int16_t* const oolong_class_layouts[1] = {"));
        assert!(text.contains("static const int32_t oolong_class_count = 0;"));
        assert!(text.contains("static void** oolong_gc_roots[1] = {"));
        assert!(text.contains("static const int32_t oolong_gc_roots_count = 0;"));
    }

    struct StubBodies;

    impl MethodBodySource for StubBodies {
        fn emit_body(
            &mut self,
            _class: &ManagedClass,
            _method: &MethodDecl,
            _ctx: &BodyContext<'_>,
            buf: &mut CodeBuffer,
            body: FragmentId,
            locals: FragmentId,
        ) -> Result<()> {
            buf.writer(locals).println("int32_t scratch;");
            buf.writer(body).println("scratch = 0;");
            Ok(())
        }
    }

    #[test]
    fn method_bodies_backfill_prototypes_before_all_definitions() {
        let fixture = Fixture::new(sample());
        let ctx = fixture.ctx();
        let mut buf = CodeBuffer::new();
        let root = buf.root();
        let protos = buf.writer(root).fragment();
        emit_method_bodies(&ctx, &mut buf, root, protos, &mut StubBodies).unwrap();
        let mut out = Vec::new();
        buf.flush(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        expect![[r#"
            static int32_t oc_core_Object_hash(oc_core_Object*);
            static void oc_app_Point_touch(oc_app_Point*);
            static oc_app_Point* oc_app_Point_make(int32_t);
            static int32_t oc_core_Object_hash(oc_core_Object* self) {
                int32_t scratch;
                scratch = 0;
            }

            static void oc_app_Point_touch(oc_app_Point* self) {
                int32_t scratch;
                scratch = 0;
            }

            static oc_app_Point* oc_app_Point_make(int32_t p0) {
                int32_t scratch;
                scratch = 0;
            }

        "#]]
        .assert_eq(&text);
    }

    #[test]
    fn cast_helper_defines_late_and_declares_early() {
        let mut buf = CodeBuffer::new();
        let root = buf.root();
        let protos = buf.writer(root).fragment();
        buf.writer(root).println("/* sections */");
        emit_cast_failure_helper(&mut buf, root, protos);
        let mut out = Vec::new();
        buf.flush(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        expect![[r#"
            static void* oolong_throw_cce(void);
            /* sections */
            static void* oolong_throw_cce(void) {
                oolong_rt_throw_cast_error();
                return NULL;
            }

        "#]]
        .assert_eq(&text);
    }
}
