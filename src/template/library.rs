//! Built-in glue templates
//!
//! Every wrapper brackets the call with `scriptPrepare`/`scriptFinalize`, holds an
//! `ArgLock` across unpacking and invocation, and turns any thrown
//! `std::exception` into a host error tagged with the qualified name.

use super::{SubstitutionTable, Template, TemplateError};

const FREE_FUNCTION: &str = r#"
static ScriptObject* _W_$FUNCNAME (ScriptObject* _self, ScriptObject* _linargs, ScriptObject* _kwds) {
    try {
        ScriptArgs _args(_linargs, _kwds);
        ScriptParent* _parent = _args.obtainParent();
        scriptPrepare(_parent, "$FUNCNAME");
        ScriptObject* _retval = 0;
        {
            ArgLock _lock;
            $ARGLOADER
            @IF($RET_VOID)
                _retval = scriptNone();
                $FUNCNAME($CALLSTRING);
            @ELSE
                _retval = toScript($FUNCNAME($CALLSTRING));
            @END
            _args.check();
        }
        scriptFinalize(_parent, "$FUNCNAME");
        return _retval;
    } catch (std::exception& e) {
        scriptSetError("$FUNCNAME", e.what());
        return 0;
    }
}
static const ScriptRegister _RP_$FUNCNAME ("","$FUNCNAME",_W_$FUNCNAME);
"#;

const MEMBER_FUNCTION: &str = r#"
static ScriptObject* _W_$FUNCNAME (ScriptObject* _self, ScriptObject* _linargs, ScriptObject* _kwds) {
    try {
        ScriptArgs _args(_linargs, _kwds);
        $CLASS* _obj = dynamic_cast<$CLASS*>(ScriptClass::fromScriptObject(_self));
        scriptPrepare(_obj->getParent(), "$CLASS::$FUNCNAME");
        ScriptObject* _retval = 0;
        {
            ArgLock _lock;
            $ARGLOADER
            _obj->_args.copy(_args);
            @IF($RET_VOID)
                _retval = scriptNone();
                _obj->$FUNCNAME($CALLSTRING);
            @ELSE
                _retval = toScript(_obj->$FUNCNAME($CALLSTRING));
            @END
            _args.check();
        }
        scriptFinalize(_obj->getParent(), "$CLASS::$FUNCNAME");
        return _retval;
    } catch (std::exception& e) {
        scriptSetError("$CLASS::$FUNCNAME", e.what());
        return 0;
    }
}
"#;

const CONSTRUCTOR: &str = r#"
static int _W_$CLASS (ScriptObject* _self, ScriptObject* _linargs, ScriptObject* _kwds) {
    ScriptClass* obj = ScriptClass::fromScriptObject(_self);
    if (obj) delete obj;
    try {
        ScriptArgs _args(_linargs, _kwds);
        scriptPrepare(0, "$CLASS::$FUNCNAME");
        {
            ArgLock _lock;
            $ARGLOADER
            obj = new $CLASS($CALLSTRING);
            std::string _name = _args.getOpt<std::string>("name", "");
            obj->setScriptObject(_self);
            if (!_name.empty()) obj->setName(_name);
            _args.check();
        }
        scriptFinalize(obj->getParent(), "$CLASS::$FUNCNAME");
        return 0;
    } catch (std::exception& e) {
        scriptSetError("$CLASS::$FUNCNAME", e.what());
        return -1;
    }
}
"#;

const REGISTER_METHOD: &str = r#"
@IF($CTPL)
    static const ScriptRegister _R_$CLASS_$CL_$FUNCNAME ("$CLASS<$CTPL>","$FUNCNAME",$CLASS<$CTPL>::_W_$FUNCNAME);
@ELSE
    static const ScriptRegister _R_$CLASS_$FUNCNAME ("$CLASS","$FUNCNAME",$CLASS::_W_$FUNCNAME);
@END
"#;

const GET_SET: &str = r#"
static ScriptObject* _GET_$NAME (ScriptObject* _self, void* _cl) {
    try {
        $CLASS* _obj = dynamic_cast<$CLASS*>(ScriptClass::fromScriptObject(_self));
        return $TO_HOST;
    } catch (std::exception& e) {
        scriptSetError("$CLASS::$NAME", e.what());
        return 0;
    }
}
static int _SET_$NAME (ScriptObject* _self, ScriptObject* _val, void* _cl) {
    try {
        $CLASS* _obj = dynamic_cast<$CLASS*>(ScriptClass::fromScriptObject(_self));
        _obj->$NAME = $FROM_HOST;
        return 0;
    } catch (std::exception& e) {
        scriptSetError("$CLASS::$NAME", e.what());
        return -1;
    }
}
"#;

const REGISTER_GET_SET: &str = r#"
@IF($CTPL)
    static const ScriptRegister _R_$CLASS_$CL_$NAME ("$CLASS<$CTPL>","$EXTNAME",$CLASS<$CTPL>::_GET_$NAME,$CLASS<$CTPL>::_SET_$NAME);
@ELSE
    static const ScriptRegister _R_$CLASS_$NAME ("$CLASS","$EXTNAME",$CLASS::_GET_$NAME,$CLASS::_SET_$NAME);
@END
"#;

const REGISTER_CLASS: &str = r#"
@IF(TPL)
    static const ScriptRegister _R_$CLASS_$CL ("$CLASS<$CT>","$EXTNAME<$CT>","$BASE$BTPL");
    template<> const char* $CLASS<$CT>::_class = "$CLASS<$CT>";
@ELSE
    static const ScriptRegister _R_$CLASS ("$CLASS","$EXTNAME","$BASE$BTPL");
    const char* $CLASS::_class = "$CLASS";
@END
"#;

/// Identifies one of the built-in templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    FreeFunction,
    MemberFunction,
    Constructor,
    RegisterMethod,
    GetSet,
    RegisterGetSet,
    RegisterClass,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 7] = [
        TemplateKind::FreeFunction,
        TemplateKind::MemberFunction,
        TemplateKind::Constructor,
        TemplateKind::RegisterMethod,
        TemplateKind::GetSet,
        TemplateKind::RegisterGetSet,
        TemplateKind::RegisterClass,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TemplateKind::FreeFunction => "free-function",
            TemplateKind::MemberFunction => "member-function",
            TemplateKind::Constructor => "constructor",
            TemplateKind::RegisterMethod => "register-method",
            TemplateKind::GetSet => "get-set",
            TemplateKind::RegisterGetSet => "register-get-set",
            TemplateKind::RegisterClass => "register-class",
        }
    }

    fn source(self) -> &'static str {
        match self {
            TemplateKind::FreeFunction => FREE_FUNCTION,
            TemplateKind::MemberFunction => MEMBER_FUNCTION,
            TemplateKind::Constructor => CONSTRUCTOR,
            TemplateKind::RegisterMethod => REGISTER_METHOD,
            TemplateKind::GetSet => GET_SET,
            TemplateKind::RegisterGetSet => REGISTER_GET_SET,
            TemplateKind::RegisterClass => REGISTER_CLASS,
        }
    }
}

/// The parsed set of built-in templates
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
}

impl TemplateLibrary {
    /// Parse all built-in templates
    pub fn builtin() -> Result<Self, TemplateError> {
        let templates = TemplateKind::ALL
            .iter()
            .map(|kind| Template::parse(kind.name(), kind.source()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { templates })
    }

    pub fn get(&self, kind: TemplateKind) -> &Template {
        // `templates` is built from `TemplateKind::ALL` in declaration order
        &self.templates[kind as usize]
    }

    /// Expand a template; the result is trimmed of the surrounding whitespace
    /// the template source carries
    pub fn expand(&self, kind: TemplateKind, table: &SubstitutionTable) -> Result<String, TemplateError> {
        Ok(self.get(kind).expand(table)?.trim().to_string())
    }
}
