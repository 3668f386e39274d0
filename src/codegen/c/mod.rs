//! C emission backend.
//!
//! Turns a fully-analyzed program model into one directly compilable C
//! source unit: class structs, virtual dispatch tables, runtime type
//! metadata, collector root tables, and an entry function, bracketed by the
//! embedded runtime templates. Statement lowering stays outside; the
//! [`MethodBodySource`] seam hands each body to the caller with fragments
//! positioned inside the emitted braces.

mod call_sites;
pub mod characteristics;
pub mod class_order;
mod classes;
mod context;
pub mod names;
pub mod registry;
mod startup;
pub mod string_pool;
pub mod tags;
pub mod templates;
pub mod type_collector;
pub mod vtables;
pub mod writer;

use std::io;
use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::error::Result;
use crate::model::{CallSiteDescriptor, ClassTable, ManagedClass, MethodDecl, MethodSignature};

use self::characteristics::Characteristics;
use self::class_order::resolve_class_order;
use self::context::GenerationContext;
use self::names::NameProvider;
use self::registry::VirtualRegistryBuilder;
use self::string_pool::{StringPool, StringPoolBuilder};
use self::tags::TagRegistry;
use self::templates::RuntimeTemplates;
use self::type_collector::collect_types;
use self::vtables::VirtualTableProvider;
use self::writer::{CodeBuffer, CodeWriter, FragmentId};

use super::EmitSummary;

/// Backend configuration.
#[derive(Debug, Clone)]
pub struct CTargetOptions {
    /// Bytes the generated entry function reserves up front.
    pub min_heap_size: u64,
    /// Directory holding replacement runtime templates. `None` uses the
    /// embedded ones.
    pub template_dir: Option<PathBuf>,
}

impl Default for CTargetOptions {
    fn default() -> Self {
        Self {
            min_heap_size: 32 * 1024 * 1024,
            template_dir: None,
        }
    }
}

/// Frozen lookup state handed to the body lowering seam: claimed symbols,
/// pool indices, and resolved dispatch tables.
pub struct BodyContext<'a> {
    pub names: &'a NameProvider,
    pub pool: &'a StringPool,
    pub vtables: &'a VirtualTableProvider,
}

/// Statement lowering seam.
///
/// The backend owns signatures, receivers and braces; the implementation
/// writes the statement stream through `body` and hoists C locals through
/// `locals`, both positioned inside the braces of the method being emitted.
pub trait MethodBodySource {
    fn emit_body(
        &mut self,
        class: &ManagedClass,
        method: &MethodDecl,
        ctx: &BodyContext<'_>,
        buf: &mut CodeBuffer,
        body: FragmentId,
        locals: FragmentId,
    ) -> Result<()>;
}

/// The C target. One value can run any number of emission passes; each pass
/// is single-threaded, run-to-completion, and either flushes a complete
/// unit or writes nothing.
pub struct CTarget {
    options: CTargetOptions,
}

impl CTarget {
    #[must_use]
    pub fn new(options: CTargetOptions) -> Self {
        Self { options }
    }

    /// Emits the full C unit for `program` into `sink`.
    ///
    /// `call_sites` becomes the exception location table, `entry` names the
    /// method `main` hands control to, and `bodies` lowers each method
    /// body. Section order is fixed; see the module docs.
    pub fn emit<W: io::Write>(
        &self,
        program: &ClassTable,
        call_sites: &[CallSiteDescriptor],
        entry: &MethodSignature,
        bodies: &mut dyn MethodBodySource,
        sink: W,
    ) -> Result<EmitSummary> {
        let templates = RuntimeTemplates::load(self.options.template_dir.as_deref())?;

        let stage = Instant::now();
        let traits = Characteristics::compute(program);
        let registry = VirtualRegistryBuilder::scan_program(program);
        let order = resolve_class_order(program);
        let tags = TagRegistry::assign(program, &traits);
        let collected = collect_types(program, &order, &traits);
        let vtables = VirtualTableProvider::build(program, &order, &traits, &registry);
        let names = NameProvider::build(program, collected.types(), |ty| {
            traits.needs_virtual_table(ty)
        });
        let mut pool = StringPoolBuilder::new();
        string_pool::fill_from_bodies(&mut pool, program);
        string_pool::fill_from_call_sites(&mut pool, call_sites);
        for ty in collected.types() {
            pool.intern(&ty.runtime_name());
        }
        let pool = pool.freeze();
        info!(
            target: "cgen",
            stage = "resolve",
            classes = program.len(),
            types = collected.len(),
            strings = pool.len(),
            elapsed_ms = stage.elapsed().as_millis() as u64,
        );

        let ctx = GenerationContext {
            program,
            traits: &traits,
            order: &order,
            tags: &tags,
            collected: &collected,
            vtables: &vtables,
            names: &names,
            pool: &pool,
        };

        let stage = Instant::now();
        let mut buf = CodeBuffer::new();
        let root = buf.root();
        emit_template(&mut buf.writer(root), templates.prologue());
        classes::emit_forward_typedefs(&ctx, &mut buf.writer(root))?;
        let protos = {
            let mut w = buf.writer(root);
            let protos = w.fragment();
            w.newline();
            protos
        };
        classes::emit_class_structs(&ctx, &mut buf.writer(root))?;
        classes::emit_vtable_structs(&ctx, &mut buf.writer(root))?;
        string_pool::emit_pool_table(&mut buf.writer(root), &pool);
        classes::emit_layout_tables(&ctx, &mut buf.writer(root))?;
        classes::emit_metadata_forward_decls(&ctx, &mut buf.writer(root))?;
        classes::emit_metadata_definitions(&ctx, &mut buf.writer(root))?;
        classes::emit_supertype_helpers(&ctx, &mut buf.writer(root))?;
        classes::emit_gc_roots(&ctx, &mut buf.writer(root))?;
        call_sites::emit_call_site_table(&mut buf.writer(root), &pool, call_sites)?;
        classes::emit_method_bodies(&ctx, &mut buf, root, protos, bodies)?;
        classes::emit_cast_failure_helper(&mut buf, root, protos);
        emit_template(&mut buf.writer(root), templates.epilogue());
        startup::emit_entry_function(&ctx, &mut buf.writer(root), entry, self.options.min_heap_size)?;
        info!(
            target: "cgen",
            stage = "generate",
            elapsed_ms = stage.elapsed().as_millis() as u64,
        );

        let stage = Instant::now();
        let mut sink = HashingSink {
            inner: sink,
            hasher: blake3::Hasher::new(),
        };
        let metrics = buf.flush(&mut sink)?;
        let fingerprint = sink.hasher.finalize().to_hex().to_string();
        info!(
            target: "cgen",
            stage = "flush",
            bytes = metrics.bytes_written,
            lines = metrics.lines,
            elapsed_ms = stage.elapsed().as_millis() as u64,
        );

        Ok(EmitSummary {
            classes: program.len(),
            types: collected.len(),
            strings: pool.len(),
            call_sites: call_sites.len(),
            bytes_written: metrics.bytes_written as u64,
            fingerprint,
        })
    }
}

/// Templates flush line by line so CRLF overrides normalize and the last
/// line always terminates.
fn emit_template(w: &mut CodeWriter<'_>, text: &str) {
    for line in text.lines() {
        w.println(line);
    }
    w.newline();
}

/// Counts and hashes everything on the way to the real sink, so the
/// summary's fingerprint always matches the bytes that actually landed.
struct HashingSink<W> {
    inner: W,
    hasher: blake3::Hasher,
}

impl<W: io::Write> io::Write for HashingSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
