use oolong::codegen::{BodyContext, CTarget, CTargetOptions, EmitSummary, MethodBodySource};
use oolong::codegen::c::writer::{CodeBuffer, FragmentId};
use oolong::error::Result;
use oolong::model::{
    CallSiteDescriptor, ClassTable, ManagedClass, MethodBody, MethodDecl, MethodDescriptor,
    MethodSignature, PrimitiveKind, ValueType, well_known,
};

// Statement lowering is a separate concern; the suites here only need the
// seam to run for every body.
#[allow(dead_code)]
pub struct NoBodies;

impl MethodBodySource for NoBodies {
    fn emit_body(
        &mut self,
        _class: &ManagedClass,
        _method: &MethodDecl,
        _ctx: &BodyContext<'_>,
        _buf: &mut CodeBuffer,
        _body: FragmentId,
        _locals: FragmentId,
    ) -> Result<()> {
        Ok(())
    }
}

#[allow(dead_code)]
pub fn int() -> ValueType {
    ValueType::Primitive(PrimitiveKind::Int)
}

#[allow(dead_code)]
pub fn string_array() -> ValueType {
    ValueType::array_of(ValueType::object(well_known::STRING))
}

// Every suite starts from the same runtime nucleus so header stamping and
// string metadata behave as they would in a real image.
#[allow(dead_code)]
pub fn runtime_nucleus() -> ClassTable {
    let mut program = ClassTable::new();
    program.push(
        ManagedClass::new(well_known::OBJECT, None).with_method(MethodDecl::instance(
            "hash",
            MethodDescriptor::new(vec![], Some(int())),
            Some(MethodBody::default()),
        )),
    );
    program.push(ManagedClass::new(well_known::CLASS, Some(well_known::OBJECT)));
    program.push(ManagedClass::new(well_known::STRING, Some(well_known::OBJECT)));
    program
}

#[allow(dead_code)]
pub fn entry_point() -> MethodSignature {
    MethodSignature::new(
        "app.Main",
        "main",
        MethodDescriptor::new(vec![string_array()], None),
    )
}

// A minimal entry class; callers append their own body instructions.
#[allow(dead_code)]
pub fn main_class(body: MethodBody) -> ManagedClass {
    ManagedClass::new("app.Main", Some(well_known::OBJECT)).with_method(MethodDecl::of_static(
        "main",
        MethodDescriptor::new(vec![string_array()], None),
        Some(body),
    ))
}

#[allow(dead_code)]
pub fn emit_unit(program: &ClassTable, sites: &[CallSiteDescriptor]) -> (String, EmitSummary) {
    let target = CTarget::new(CTargetOptions::default());
    let mut out = Vec::new();
    let summary = target
        .emit(program, sites, &entry_point(), &mut NoBodies, &mut out)
        .unwrap_or_else(|err| panic!("emission failed: {err}"));
    let text = String::from_utf8(out).unwrap_or_else(|err| panic!("unit is not UTF-8: {err}"));
    (text, summary)
}
