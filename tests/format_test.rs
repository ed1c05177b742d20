// End-to-end formatting tests for the full lex → parse → format pipeline.

use bettyfmt::{format, format_with_report};

#[test]
fn test_canonical_style_end_to_end() {
    let source = "int add(int a,int b){return a+b;}";
    assert_eq!(
        format(source),
        "int add(int a, int b)\n{\n\treturn (a + b);\n}\n"
    );
}

#[test]
fn test_full_program_round_trip() {
    let source = "\
#include <stdio.h>
#include <stdlib.h>

typedef struct node
{
\tint value;
\tstruct node *next;
} node_t;

node_t *list_push(node_t *head, int value)
{
\tnode_t *fresh;

\tfresh = malloc(sizeof(node_t));
\tif (fresh == NULL)
\t\treturn (NULL);
\tfresh->value = value;
\tfresh->next = head;
\treturn (fresh);
}
";
    // Already canonical, so the formatter must be a fixed point here.
    assert_eq!(format(source), source);
}

#[test]
fn test_idempotence_on_messy_input() {
    let samples = [
        "int main(){int x=1;if(x>0){x--;}else{x++;}return x;}",
        "void sort(int*a,int n){int i,j,t;for(i=0;i<n-1;i++)for(j=0;j<n-i-1;j++)if(a[j]>a[j+1]){t=a[j];a[j]=a[j+1];a[j+1]=t;}}",
        "enum state{IDLE,RUNNING=5,DONE};\nint s=IDLE;\n",
        "typedef unsigned long ulong_t;\nulong_t mask = ~0;\n",
        "struct pair{int a;int b;};\nstruct pair p = {1, 2};\n",
    ];
    for source in samples {
        let once = format(source);
        let twice = format(&once);
        assert_eq!(once, twice, "not idempotent for {source:?}");
    }
}

#[test]
fn test_typedef_disambiguation() {
    let source = "typedef struct { int v; } foo_t;\nfoo_t *x;\n";
    let (out, report) = format_with_report(source);
    // `foo_t *x;` must come out as a declaration, not `foo_t * x` arithmetic.
    assert_eq!(report.parse_recoveries, 0);
    assert!(out.contains("foo_t *x;"));
}

#[test]
fn test_precedence_is_preserved() {
    let out = format("int f(void){return a+b*c;}");
    assert!(out.contains("return (a + b * c);"));
    let regrouped = format("int f(void){return (a+b)*c;}");
    assert!(regrouped.contains("return ((a + b) * c);"));
}

#[test]
fn test_blank_lines_collapse() {
    let out = format("int a;\n\n\n\n\nint b;\n");
    assert!(out.contains("int a;\n\nint b;\n"));
    assert!(!out.contains("\n\n\n"));
}

#[test]
fn test_comments_survive_and_normalize() {
    let source = "\
// File header comment
int counter; // how many
/* already block form */
int other;
";
    let out = format(source);
    assert!(out.contains("/* File header comment */"));
    assert!(out.contains("int counter; /* how many */"));
    assert!(out.contains("/* already block form */"));
    assert!(!out.contains("//"));
}

#[test]
fn test_comment_inside_declaration_survives_once() {
    // The declaration is first tried as a function header and rewound; the
    // comment must come through exactly once, with its declaration.
    let out = format("size_t /* count */ n;\nint y;\n");
    assert_eq!(out.matches("/* count */").count(), 1);
    assert!(out.contains("/* count */\nsize_t n;"));
}

#[test]
fn test_comment_before_closing_brace_stays_inside() {
    let source = "void f(void)\n{\n\twork();\n\t/* last */\n}\nint y;\n";
    let out = format(source);
    assert!(out.contains("\t/* last */\n}\n"));
    assert!(out.contains("}\n\nint y;\n"));
}

#[test]
fn test_record_definition_with_variable() {
    let out = format("struct { int a; } s;\n");
    assert_eq!(out, "struct\n{\n\tint a;\n} s;\n");
    let shade = format("enum color { RED, GREEN } shade;\n");
    assert!(shade.contains("} shade;\n"));
}

#[test]
fn test_unmodeled_construct_survives_byte_for_byte() {
    let asm = "__asm__ {\n  mov eax, 1\n  int 0x80\n}";
    let source = format!("int before;\n{asm}\nint after;\n");
    let (out, report) = format_with_report(&source);
    assert!(report.parse_recoveries >= 1);
    assert!(out.contains(asm), "inline asm was altered:\n{out}");
    assert!(out.contains("int before;"));
    assert!(out.contains("int after;"));
}

#[test]
fn test_goto_survives_inside_function() {
    let source = "\
void cleanup(int fd)
{
\tif (fd < 0)
\t\tgoto out;
\tclose(fd);
out:
\treturn;
}
";
    let out = format(source);
    assert!(out.contains("goto out;"));
    assert!(out.contains("out:"));
}

#[test]
fn test_lexer_errors_do_not_abort() {
    let (out, report) = format_with_report("char *s = \"unterminated\nint x;\n");
    assert_eq!(report.lex_errors, 1);
    assert!(out.contains("int x;"));
}

#[test]
fn test_preprocessor_directives_pass_through() {
    let source = "\
#include <stdio.h>
#define MAX(a, b) ((a) > (b) ? \\
\t(a) : (b))
#ifdef DEBUG
#endif
";
    let out = format(source);
    assert!(out.contains("#include <stdio.h>"));
    assert!(out.contains("#define MAX(a, b) ((a) > (b) ? \\\n\t(a) : (b))"));
    assert!(out.contains("#ifdef DEBUG"));
}

#[test]
fn test_directive_inside_function_body() {
    let source = "void f(void)\n{\n#ifdef DEBUG\n\ttrace();\n#endif\n}\n";
    let out = format(source);
    assert!(out.contains("\n#ifdef DEBUG\n\ttrace();\n#endif\n"));
    assert_eq!(format(&out), out);
}

#[test]
fn test_control_flow_layout() {
    let source = "void f(int n){while(n>0){n--;}do{poll();}while(busy());switch(n){case 0:done();break;default:retry();}}";
    let out = format(source);
    assert!(out.contains("\twhile (n > 0)\n\t{\n\t\tn--;\n\t}\n"));
    assert!(out.contains("\tdo {\n\t\tpoll();\n\t} while (busy());\n"));
    assert!(out.contains("\tswitch (n)\n\t{\n\tcase 0:\n\t\tdone();\n\t\tbreak;\n\tdefault:\n\t\tretry();\n\t}\n"));
}

#[test]
fn test_function_pointer_declarations() {
    let out = format("typedef int (*cmp_fn)(const void *, const void *);\nint (*handler)(int);\n");
    assert!(out.contains("typedef int (*cmp_fn)(const void *, const void *);"));
    assert!(out.contains("int (*handler)(int);"));
}

#[test]
fn test_gnu_attributes_survive() {
    let out = format("void fail(const char *msg) __attribute__((noreturn));\n");
    assert!(out.contains("__attribute__((noreturn))"));
}

#[test]
fn test_no_input_text_is_dropped() {
    // Every identifier from a messy mixed input must appear in the output.
    let source = "int ok;\n$$$ bad $$$\nstruct s { int m; };\nvoid f(void) { weird ~~~ ; good(); }\n";
    let out = format(source);
    for word in ["ok", "bad", "m", "weird", "good"] {
        assert!(out.contains(word), "lost {word:?} in:\n{out}");
    }
}
