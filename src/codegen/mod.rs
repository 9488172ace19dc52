//! Declaration processors
//!
//! [`Generator::generate`] walks a [`SourceFile`] in source order. Verbatim code
//! is copied to the inline channel and every annotated [`Block`] is handed to
//! the processor for its declaration kind:
//!
//! - functions become call wrappers (free, member or constructor)
//! - member variables become get/set accessor pairs
//! - classes are reprocessed member by member and registered
//! - template aliases only request an instantiation from the linker
//!
//! The first usage error aborts the file; no partial output is returned.

pub mod loader;
mod sink;

pub use sink::Sink;

use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::error::GenerateError;
use crate::link::LinkRecord;
use crate::model::{Block, Class, Declaration, Function, Instantiation, Item, SourceFile, Variable};
use crate::template::{SubstitutionTable, TemplateError, TemplateKind, TemplateLibrary};

/// Options accepted on function blocks
const FUNCTION_OPTIONS: &[&str] = &[];
/// Options accepted on class and variable blocks
const NAME_OPTIONS: &[&str] = &["name"];
/// Options accepted on instantiation blocks
const INSTANTIATION_OPTIONS: &[&str] = &[];

/// Members added to every processed class before it is closed
const IMPLICIT_MEMBERS: &str = "public: ScriptArgs _args; static const char* _class; ";

/// Activation record of a class whose body is being processed
#[derive(Debug)]
pub struct ClassFrame<'a> {
    pub class: &'a Class,
    /// Set when an annotated constructor is seen in the body
    pub found_constructor: bool,
}

impl<'a> ClassFrame<'a> {
    pub fn new(class: &'a Class) -> Self {
        Self {
            class,
            found_constructor: false,
        }
    }
}

/// Generates glue code and link records from declaration models
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
    templates: TemplateLibrary,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Result<Self, TemplateError> {
        Ok(Self {
            config,
            templates: TemplateLibrary::builtin()?,
        })
    }

    /// Process all items of a file
    pub fn generate(&self, file: &SourceFile) -> Result<Sink, GenerateError> {
        info!(
            path = %file.path,
            header = file.header,
            items = file.items.len(),
            doc_mode = self.config.doc_mode,
            "generating glue"
        );
        let mut sink = Sink::new(file.header);
        self.process_items(&file.items, None, &mut sink)?;
        debug!(
            path = %file.path,
            inline_bytes = sink.inplace.len(),
            link_records = sink.link.len(),
            "file done"
        );
        Ok(sink)
    }

    fn process_items(
        &self,
        items: &[Item],
        mut owner: Option<&mut ClassFrame<'_>>,
        sink: &mut Sink,
    ) -> Result<(), GenerateError> {
        for item in items {
            match item {
                Item::Code { text } => sink.inplace.push_str(text),
                Item::Block(block) => self.process_block(block, owner.as_deref_mut(), sink)?,
            }
        }
        Ok(())
    }

    /// Dispatch one block to the processor for its declaration kind
    pub fn process_block(
        &self,
        block: &Block,
        owner: Option<&mut ClassFrame<'_>>,
        sink: &mut Sink,
    ) -> Result<(), GenerateError> {
        match &block.decl {
            Declaration::Function(func) => self.process_function(block, func, owner, sink),
            Declaration::Variable(var) => {
                self.process_variable(block, var, owner.map(|frame| frame.class), sink)
            }
            Declaration::Class(cls) => self.process_class(block, cls, sink),
            Declaration::Instantiation(inst) => self.process_instantiation(block, inst, sink),
        }
    }

    /// Free (plugin), member or constructor function
    pub fn process_function(
        &self,
        block: &Block,
        func: &Function,
        owner: Option<&mut ClassFrame<'_>>,
        sink: &mut Sink,
    ) -> Result<(), GenerateError> {
        if let Some(option) = block.options.first() {
            return Err(GenerateError::unknown_option(
                block.line,
                &option.name,
                FUNCTION_OPTIONS,
            ));
        }

        let is_constructor = func.is_constructor();
        let is_plugin = owner.is_none();
        if is_plugin && sink.is_header {
            return Err(GenerateError::PluginInHeader { line: block.line });
        }

        let class = owner.map(|frame| {
            if is_constructor {
                frame.found_constructor = true;
            }
            frame.class
        });

        debug!(
            line = block.line,
            function = %func.name,
            class = class.map(|c| c.name.as_str()).unwrap_or(""),
            is_constructor,
            arguments = func.arguments.len(),
            "processing function"
        );

        let signature = format!("{}{}", func.signature(), func.init_list);
        if self.config.doc_mode {
            if is_plugin {
                sink.inplace.push_str("//! \\ingroup Plugins\n");
            }
            sink.inplace
                .push_str(&format!("{} {}{{}}\n", self.config.annotation, signature));
            return Ok(());
        }

        sink.inplace.push_str(&block.linebreak_text());
        sink.inplace.push_str(&signature);
        sink.inplace.push_str(&func.body);

        let loader = loader::generate_loaders(func, &self.config.types).concat();
        let class_name = class.map(|c| c.name.as_str()).unwrap_or("");
        let templated = class.is_some_and(Class::is_templated);
        let table = SubstitutionTable::new()
            .with("FUNCNAME", func.name.as_str())
            .with("ARGLOADER", loader)
            .with("CLASS", class_name)
            .with("CTPL", if templated { "$CT" } else { "" })
            .with_deferred("CL")
            .with("CALLSTRING", func.call_string())
            .with("RET_VOID", if func.returns_void() { "Y" } else { "" });

        let kind = if is_constructor {
            TemplateKind::Constructor
        } else if is_plugin {
            TemplateKind::FreeFunction
        } else {
            TemplateKind::MemberFunction
        };
        sink.inplace.push_str(&self.templates.expand(kind, &table)?);

        if !is_plugin && !is_constructor {
            let statement = self.templates.expand(TemplateKind::RegisterMethod, &table)?;
            sink.push_link(LinkRecord::register(class_name, statement));
        }
        Ok(())
    }

    /// Member variable exposed as a property
    pub fn process_variable(
        &self,
        block: &Block,
        var: &Variable,
        owner: Option<&Class>,
        sink: &mut Sink,
    ) -> Result<(), GenerateError> {
        let class = owner.ok_or(GenerateError::VariableOutsideClass { line: block.line })?;
        let external_name = self.external_name(block, &var.name)?;

        debug!(
            line = block.line,
            variable = %var.name,
            class = %class.name,
            external_name,
            "processing variable"
        );

        if self.config.doc_mode {
            sink.inplace
                .push_str(&format!("{} {};\n", self.config.annotation, var.declaration()));
            return Ok(());
        }

        sink.inplace.push_str(&block.linebreak_text());
        sink.inplace.push_str(&var.declaration());
        sink.inplace.push(';');

        let conversion = self.config.types.kind_of(&var.ty).conversion();
        let table = SubstitutionTable::new()
            .with("NAME", var.name.as_str())
            .with("CLASS", class.name.as_str())
            .with("CTPL", if class.is_templated() { "$CT" } else { "" })
            .with_deferred("CL")
            .with("EXTNAME", external_name)
            .with("TO_HOST", conversion.to_host(&format!("_obj->{}", var.name)))
            .with("FROM_HOST", conversion.from_host(&var.ty, "_val"));

        sink.inplace
            .push_str(&self.templates.expand(TemplateKind::GetSet, &table)?);
        let statement = self.templates.expand(TemplateKind::RegisterGetSet, &table)?;
        sink.push_link(LinkRecord::register(class.name.as_str(), statement));
        Ok(())
    }

    /// Class declaration; its body is reprocessed with the class as owner
    pub fn process_class(&self, block: &Block, cls: &Class, sink: &mut Sink) -> Result<(), GenerateError> {
        if !sink.is_header {
            return Err(GenerateError::ClassOutsideHeader { line: block.line });
        }
        let external_name = self.external_name(block, &cls.name)?;

        debug!(
            line = block.line,
            class = %cls.name,
            external_name,
            templated = cls.is_templated(),
            "processing class"
        );

        if self.config.doc_mode {
            sink.inplace.push_str(&format!(
                "//! \\ingroup ScriptClasses\n{} {}{{}};\n",
                self.config.annotation,
                cls.signature()
            ));
            return Ok(());
        }

        sink.inplace.push_str(&block.linebreak_text());
        sink.inplace.push_str(&cls.signature());
        sink.inplace.push('{');

        let mut frame = ClassFrame::new(cls);
        self.process_items(&cls.body, Some(&mut frame), sink)?;
        if !frame.found_constructor {
            return Err(GenerateError::missing_constructor(block.line, &cls.name));
        }

        sink.inplace.push_str(IMPLICIT_MEMBERS);
        sink.inplace.push_str("};");

        let base_name = cls.base.as_ref().map(|b| b.name.as_str()).unwrap_or("");
        let table = SubstitutionTable::new()
            .with("CLASS", cls.name.as_str())
            .with("BASE", base_name)
            .with("BTPL", if cls.base_is_templated() { "<$BT>" } else { "" })
            .with("EXTNAME", external_name)
            .with("TPL", if cls.is_templated() { "Y" } else { "" })
            .with_deferred("CT")
            .with_deferred("CL")
            .with_deferred("BT");
        let statement = self.templates.expand(TemplateKind::RegisterClass, &table)?;
        sink.push_link(LinkRecord::register(cls.name.as_str(), statement));

        if !cls.is_templated() {
            sink.push_link(LinkRecord::instantiate(cls.name.as_str(), ""));
        }
        if let Some(base) = cls.base.as_ref().filter(|b| b.is_templated()) {
            sink.push_link(LinkRecord::depends_on(
                cls.name.as_str(),
                cls.tpl_string(),
                base.name.as_str(),
                base.tpl_string(),
            ));
        }
        Ok(())
    }

    /// Template alias whose concrete instantiation must be registered
    pub fn process_instantiation(
        &self,
        block: &Block,
        inst: &Instantiation,
        sink: &mut Sink,
    ) -> Result<(), GenerateError> {
        if !sink.is_header {
            return Err(GenerateError::InstantiationOutsideHeader { line: block.line });
        }
        if let Some(option) = block.options.first() {
            return Err(GenerateError::unknown_option(
                block.line,
                &option.name,
                INSTANTIATION_OPTIONS,
            ));
        }

        debug!(
            line = block.line,
            alias = %inst.alias,
            class = %inst.ty.name,
            args = %inst.ty.list_text(),
            "processing instantiation"
        );

        if !self.config.doc_mode {
            sink.push_link(LinkRecord::instantiate(
                inst.ty.name.as_str(),
                inst.ty.list_text(),
            ));
        }
        sink.inplace.push_str(&block.linebreak_text());
        Ok(())
    }

    /// Value of the `name` option, rejecting any other option
    fn external_name<'b>(&self, block: &'b Block, declared: &'b str) -> Result<&'b str, GenerateError> {
        let mut name = declared;
        for option in &block.options {
            if option.name == "name" {
                name = option.value.as_str();
            } else {
                return Err(GenerateError::unknown_option(
                    block.line,
                    &option.name,
                    NAME_OPTIONS,
                ));
            }
        }
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Argument, BaseClass, Type};
    use pretty_assertions::assert_eq;

    fn generator() -> Generator {
        Generator::new(GeneratorConfig::default()).unwrap()
    }

    fn ctor_block(line: usize, class: &str) -> Item {
        Block::new(line, Declaration::Function(Function::new(class, None).with_body("{}"))).into()
    }

    fn method_block(line: usize, name: &str) -> Item {
        Block::new(
            line,
            Declaration::Function(Function::new(name, Some(Type::new("Real"))).with_body("{ return 1; }")),
        )
        .into()
    }

    fn class_block(line: usize, cls: Class) -> Block {
        Block::new(line, Declaration::Class(cls))
    }

    #[test]
    fn test_plugin_void_function() {
        let func = Function::new("foo", Some(Type::new("void")))
            .with_argument(Argument::new("a", Type::new("int"), 0))
            .with_argument(Argument::new("b", Type::new("float"), 1).with_default("2.0"))
            .with_body("{ }");
        let block = Block::new(5, Declaration::Function(func.clone()));
        let mut sink = Sink::new(false);
        generator()
            .process_function(&block, &func, None, &mut sink)
            .unwrap();

        assert!(sink.inplace.starts_with("void foo(int a, float b = 2.0){ }static ScriptObject* _W_foo ("));
        assert!(sink.inplace.contains("int a = _args.get<int >(0,\"a\",&_lock); "));
        assert!(sink.inplace.contains("float b = _args.getOpt<float >(1,\"b\",2.0,&_lock); "));
        assert!(sink.inplace.contains("_retval = scriptNone(); foo(a, b);"));
        assert!(!sink.inplace.contains("toScript(foo("));
        assert!(sink.link.is_empty());
    }

    #[test]
    fn test_plugin_rejected_in_header() {
        let func = Function::new("foo", Some(Type::new("void")));
        let block = Block::new(7, Declaration::Function(func.clone()));
        let mut sink = Sink::new(true);
        let err = generator()
            .process_function(&block, &func, None, &mut sink)
            .unwrap_err();
        assert_eq!(err, GenerateError::PluginInHeader { line: 7 });
    }

    #[test]
    fn test_function_options_rejected() {
        let func = Function::new("foo", Some(Type::new("void")));
        let block = Block::new(3, Declaration::Function(func.clone())).with_option("name", "bar");
        let mut sink = Sink::new(false);
        let err = generator()
            .process_function(&block, &func, None, &mut sink)
            .unwrap_err();
        assert!(matches!(err, GenerateError::UnknownOption { line: 3, .. }));
    }

    #[test]
    fn test_member_function_registers_under_class() {
        let cls = Class::new("Sphere");
        let mut frame = ClassFrame::new(&cls);
        let func = Function::new("volume", Some(Type::new("Real")));
        let block = Block::new(9, Declaration::Function(func.clone()));
        let mut sink = Sink::new(true);
        generator()
            .process_function(&block, &func, Some(&mut frame), &mut sink)
            .unwrap();

        assert!(!frame.found_constructor);
        assert!(sink.inplace.contains("_retval = toScript(_obj->volume());"));
        assert!(sink.inplace.contains("scriptSetError(\"Sphere::volume\", e.what());"));
        assert_eq!(
            sink.link,
            vec![LinkRecord::register(
                "Sphere",
                r#"static const ScriptRegister _R_Sphere_volume ("Sphere","volume",Sphere::_W_volume);"#
            )]
        );
    }

    #[test]
    fn test_constructor_marks_frame_and_is_not_registered() {
        let cls = Class::new("Sphere");
        let mut frame = ClassFrame::new(&cls);
        let func = Function::new("Sphere", None)
            .with_argument(Argument::new("radius", Type::new("Real"), 0));
        let block = Block::new(4, Declaration::Function(func.clone()));
        let mut sink = Sink::new(true);
        generator()
            .process_function(&block, &func, Some(&mut frame), &mut sink)
            .unwrap();

        assert!(frame.found_constructor);
        assert!(sink.inplace.contains("static int _W_Sphere ("));
        assert!(sink.inplace.contains("obj = new Sphere(radius);"));
        assert!(sink.link.is_empty());
    }

    #[test]
    fn test_variable_with_name_override() {
        let cls = Class::new("Sphere");
        let var = Variable::new("radius", Type::new("Real"));
        let block = Block::new(6, Declaration::Variable(var.clone())).with_option("name", "r");
        let mut sink = Sink::new(true);
        generator()
            .process_variable(&block, &var, Some(&cls), &mut sink)
            .unwrap();

        assert!(sink.inplace.starts_with("Real radius;"));
        assert!(sink.inplace.contains("_GET_radius ("));
        assert!(sink.inplace.contains("return toScript(_obj->radius);"));
        assert!(sink.inplace.contains("_obj->radius = fromScript<Real >(_val);"));
        assert_eq!(
            sink.link_text(),
            "+Sphere^static const ScriptRegister _R_Sphere_radius (\"Sphere\",\"r\",Sphere::_GET_radius,Sphere::_SET_radius);\n"
        );
    }

    #[test]
    fn test_variable_requires_owner_and_known_options() {
        let var = Variable::new("radius", Type::new("Real"));
        let block = Block::new(2, Declaration::Variable(var.clone()));
        let mut sink = Sink::new(true);
        let err = generator()
            .process_variable(&block, &var, None, &mut sink)
            .unwrap_err();
        assert_eq!(err, GenerateError::VariableOutsideClass { line: 2 });

        let cls = Class::new("Sphere");
        let block = Block::new(2, Declaration::Variable(var.clone())).with_option("hidden", "1");
        let err = generator()
            .process_variable(&block, &var, Some(&cls), &mut sink)
            .unwrap_err();
        assert_eq!(err, GenerateError::unknown_option(2, "hidden", NAME_OPTIONS));
    }

    #[test]
    fn test_class_without_constructor_fails() {
        let block = class_block(10, Class::new("Empty").with_item(method_block(11, "size")));
        let err = generator().generate(&SourceFile::new("e.h", true).with_item(block)).unwrap_err();
        assert_eq!(err, GenerateError::missing_constructor(10, "Empty"));
        assert!(err.to_string().contains("'Empty'"));
    }

    #[test]
    fn test_constructor_flag_is_per_class() {
        let first = class_block(1, Class::new("A").with_item(ctor_block(2, "A")));
        let second = class_block(5, Class::new("B").with_item(method_block(6, "size")));
        let file = SourceFile::new("ab.h", true).with_item(first).with_item(second);
        let err = generator().generate(&file).unwrap_err();
        assert_eq!(err, GenerateError::missing_constructor(5, "B"));
    }

    #[test]
    fn test_class_outside_header() {
        let block = class_block(1, Class::new("A").with_item(ctor_block(2, "A")));
        let err = generator().generate(&SourceFile::new("a.cpp", false).with_item(block)).unwrap_err();
        assert_eq!(err, GenerateError::ClassOutsideHeader { line: 1 });
    }

    #[test]
    fn test_class_output_and_links() {
        let cls = Class::new("Sphere")
            .with_base(BaseClass::new("Shape"))
            .with_item(Item::code("\n"))
            .with_item(ctor_block(2, "Sphere"));
        let block = class_block(1, cls).with_option("name", "Ball");
        let sink = generator().generate(&SourceFile::new("s.h", true).with_item(block)).unwrap();

        assert!(sink.inplace.starts_with("class Sphere : public Shape {\nSphere(){}static int _W_Sphere ("));
        assert!(sink.inplace.ends_with("public: ScriptArgs _args; static const char* _class; };"));
        assert_eq!(
            sink.link,
            vec![
                LinkRecord::register(
                    "Sphere",
                    r#"static const ScriptRegister _R_Sphere ("Sphere","Ball","Shape"); const char* Sphere::_class = "Sphere";"#
                ),
                LinkRecord::instantiate("Sphere", ""),
            ]
        );
    }

    #[test]
    fn test_templated_class_with_templated_base() {
        let cls = Class::new("MACGrid")
            .with_template_param("T")
            .with_base(BaseClass::new("Grid").with_template_arg("T"))
            .with_item(ctor_block(2, "MACGrid"));
        let sink = generator()
            .generate(&SourceFile::new("g.h", true).with_item(class_block(1, cls)))
            .unwrap();

        assert_eq!(sink.link.len(), 2);
        assert_eq!(
            sink.link[0],
            LinkRecord::register(
                "MACGrid",
                r#"static const ScriptRegister _R_MACGrid_$CL ("MACGrid<$CT>","MACGrid<$CT>","Grid<$BT>"); template<> const char* MACGrid<$CT>::_class = "MACGrid<$CT>";"#
            )
        );
        assert_eq!(sink.link[1], LinkRecord::depends_on("MACGrid", "T", "Grid", "T"));
    }

    #[test]
    fn test_templated_class_with_plain_base() {
        let cls = Class::new("Grid")
            .with_template_param("T")
            .with_base(BaseClass::new("GridBase"))
            .with_item(ctor_block(2, "Grid"));
        let sink = generator()
            .generate(&SourceFile::new("g.h", true).with_item(class_block(1, cls)))
            .unwrap();

        assert!(sink.inplace.starts_with("template<class T> class Grid : public GridBase {"));
        assert_eq!(
            sink.link,
            vec![LinkRecord::register(
                "Grid",
                r#"static const ScriptRegister _R_Grid_$CL ("Grid<$CT>","Grid<$CT>","GridBase"); template<> const char* Grid<$CT>::_class = "Grid<$CT>";"#
            )]
        );
    }

    #[test]
    fn test_doc_mode_variable_stub() {
        let config = GeneratorConfig::default().with_doc_mode(true);
        let cls = Class::new("Sphere");
        let var = Variable::new("radius", Type::new("Real"));
        let block = Block::new(6, Declaration::Variable(var.clone())).with_option("name", "r");
        let mut sink = Sink::new(true);
        Generator::new(config)
            .unwrap()
            .process_variable(&block, &var, Some(&cls), &mut sink)
            .unwrap();
        assert_eq!(sink.inplace, "SCRIPT Real radius;\n");
        assert!(sink.link.is_empty());
    }

    #[test]
    fn test_doc_mode_emits_stubs_only() {
        let config = GeneratorConfig::default().with_doc_mode(true);
        let func = Function::new("foo", Some(Type::new("void")));
        let file = SourceFile::new("p.cpp", false)
            .with_item(Block::new(1, Declaration::Function(func)));
        let sink = Generator::new(config).unwrap().generate(&file).unwrap();
        assert_eq!(sink.inplace, "//! \\ingroup Plugins\nSCRIPT void foo(){}\n");
        assert!(sink.link.is_empty());
    }

    #[test]
    fn test_instantiation() {
        let inst = Instantiation {
            alias: "RealGrid".to_string(),
            ty: Type::new("Grid").with_template_arg(Type::new("Real")),
        };
        let block = Block::new(3, Declaration::Instantiation(inst.clone())).with_linebreaks(2);
        let mut sink = Sink::new(true);
        generator()
            .process_instantiation(&block, &inst, &mut sink)
            .unwrap();
        assert_eq!(sink.inplace, "\n\n");
        assert_eq!(sink.link_text(), ">Grid^Real\n");

        let mut sink = Sink::new(false);
        let err = generator()
            .process_instantiation(&block, &inst, &mut sink)
            .unwrap_err();
        assert_eq!(err, GenerateError::InstantiationOutsideHeader { line: 3 });
    }
}
