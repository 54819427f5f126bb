use roast_classfile::access::{ACC_ABSTRACT, ACC_PUBLIC};
use roast_classfile::constants::attr;

use crate::diagnostics::DiagnosticKind;
use crate::model::{Annotation, ElementValue, Retention};
use crate::options::TargetVersion;
use crate::test_utils::{
    bare_options, class, emit_dump, emit_with, field, method, parse, return_body,
};

fn unresolved_type() -> Annotation {
    Annotation {
        type_descriptor: None,
        retention: Retention::Runtime,
        elements: Vec::new(),
    }
}

#[test]
fn member_annotations() {
    let mut ty = class("a/B");
    let mut f = field(ACC_PUBLIC, "f", "I");
    f.annotations = vec![
        Annotation::new("Ljava/lang/Deprecated;", Retention::Runtime),
        Annotation::new("La/Tag;", Retention::Class)
            .element("names", "[Ljava/lang/String;", ElementValue::String("x".into()))
            .element(
                "level",
                "La/Level;",
                ElementValue::Enum {
                    type_descriptor: Some("La/Level;".into()),
                    constant: "HIGH".into(),
                },
            )
            .element(
                "inner",
                "La/In;",
                ElementValue::Annotation(Box::new(
                    Annotation::new("La/In;", Retention::Runtime).element(
                        "v",
                        "J",
                        ElementValue::Long(2),
                    ),
                )),
            ),
        Annotation::new("La/Gone;", Retention::Source),
        unresolved_type(),
        Annotation::new("La/Bad;", Retention::Class).element("v", "I", ElementValue::Unresolved),
    ];
    ty.fields.push(f);

    let mut m = method(ACC_PUBLIC | ACC_ABSTRACT, "m", "(II)V");
    m.parameter_annotations = vec![vec![Annotation::new("La/P;", Retention::Runtime)], vec![]];
    ty.methods.push(m);

    let mut value = method(ACC_PUBLIC | ACC_ABSTRACT, "value", "()[I");
    value.default_value = Some(ElementValue::Int(3));
    ty.methods.push(value);

    let mut kind = method(ACC_PUBLIC | ACC_ABSTRACT, "kind", "()Ljava/lang/Class;");
    kind.default_value = Some(ElementValue::Class(Some("Ljava/lang/String;".into())));
    ty.methods.push(kind);

    insta::assert_snapshot!(emit_dump(&ty, bare_options()), @r#"
    [class]
    version 52.0
    name a/B
    flags 0x0021
    super java/lang/Object

    [fields]
    0x0001 f I
      RuntimeVisibleAnnotations
        @Ljava/lang/Deprecated;
      RuntimeInvisibleAnnotations
        @La/Tag;(names=["x"], level=La/Level;.HIGH, inner=@La/In;(v=2L))

    [methods]
    0x0401 m (II)V
      RuntimeVisibleParameterAnnotations params=2
        0: @La/P;
    0x0401 value ()[I
      AnnotationDefault [3]
    0x0401 kind ()Ljava/lang/Class;
      AnnotationDefault Ljava/lang/String;.class

    [attributes]
    "#);
}

#[test]
fn attribute_without_survivors_is_dropped() {
    let mut ty = class("a/B");
    let mut f = field(0, "f", "I");
    f.annotations = vec![unresolved_type()];
    ty.fields.push(f);

    let emitted = emit_with(&ty, bare_options());

    assert!(parse(&emitted).fields[0].attributes.is_empty());
    assert!(emitted.diagnostics.is_empty());
}

#[test]
fn unresolved_default_is_skipped_with_warning() {
    let mut ty = class("a/B");
    let mut m = method(ACC_PUBLIC | ACC_ABSTRACT, "value", "()La/E;");
    m.default_value = Some(ElementValue::Enum {
        type_descriptor: None,
        constant: "A".into(),
    });
    ty.methods.push(m);

    let emitted = emit_with(&ty, bare_options());

    let class = parse(&emitted);
    assert!(class.methods[0].attribute(attr::ANNOTATION_DEFAULT).is_none());
    assert_eq!(emitted.diagnostics.len(), 1);
    assert!(emitted.diagnostics[0].is_warning());
    assert!(!emitted.has_errors());
}

#[test]
fn explicit_array_is_not_wrapped_again() {
    let mut ty = class("a/B");
    let mut f = field(0, "f", "I");
    f.annotations = vec![Annotation::new("La/T;", Retention::Runtime).element(
        "v",
        "[I",
        ElementValue::Array(vec![ElementValue::Int(1), ElementValue::Int(2)]),
    )];
    ty.fields.push(f);

    let dump = emit_dump(&ty, bare_options());

    assert!(dump.contains("@La/T;(v=[1, 2])"), "{dump}");
}

#[test]
fn annotations_need_generics() {
    let mut ty = class("a/B");
    let mut f = field(0, "f", "I");
    f.annotations = vec![Annotation::new("La/T;", Retention::Runtime)];
    ty.fields.push(f);
    let mut m = method(ACC_PUBLIC | ACC_ABSTRACT, "value", "()I");
    m.default_value = Some(ElementValue::Int(1));
    m.parameter_annotations = vec![vec![Annotation::new("La/P;", Retention::Class)]];
    ty.methods.push(m);

    let class = parse(&emit_with(&ty, bare_options().target(TargetVersion::Jdk1_4)));

    assert!(class.fields[0].attributes.is_empty());
    assert!(class.methods[0].attributes.is_empty());
}

#[test]
fn too_many_annotated_parameters_becomes_placeholder() {
    let mut ty = class("a/B");
    let mut m = method(ACC_PUBLIC, "m", "()V");
    m.body = Some(return_body(0, 1));
    m.parameter_annotations = vec![vec![Annotation::new("La/P;", Retention::Runtime)]; 256];
    ty.methods.push(m);

    let emitted = emit_with(&ty, bare_options());

    let diagnostic = &emitted.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::TooManyAnnotationEntries);
    assert_eq!(diagnostic.message, "256 annotated parameters (max 255)");
    let class = parse(&emitted);
    assert!(
        class.methods[0]
            .attribute(attr::RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS)
            .is_none()
    );
}

#[test]
fn oversized_array_value_drops_class_annotations() {
    let mut ty = class("a/B");
    ty.annotations = vec![Annotation::new("La/A;", Retention::Runtime).element(
        "v",
        "[I",
        ElementValue::Array(vec![ElementValue::Int(0); 65_536]),
    )];

    let emitted = emit_with(&ty, bare_options());

    assert_eq!(emitted.diagnostics.len(), 1);
    assert_eq!(
        emitted.diagnostics[0].kind,
        DiagnosticKind::TooManyAnnotationEntries
    );
    assert_eq!(emitted.diagnostics[0].message, "65536 array elements (max 65535)");
    assert!(parse(&emitted).attribute(attr::RUNTIME_VISIBLE_ANNOTATIONS).is_none());
}
