//! Code generation: lower the syntax tree into 32-bit x86 assembly for the
//! flat assembler (fasm), producing a Windows PE GUI executable.
//!
//! Variables live in a flat `_Vars` block of `NUM_VARS` dwords and are always
//! addressed through `ebx`. The generated program reads its inputs through a
//! small modal input box and shows the result in a message box. Everything
//! after the program body is fixed runtime support.
//!
//! An assigned literal that does not fit a variable compiles to a jump to an
//! `overflow` exit, which reports the fault and exits with code -4, where the
//! interpreter raises `VmFault::Overflow`.
//!
//! The walk recurses once per `WHILE`, so nesting depth is bounded by the
//! stack.

use log::debug;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::vm::{NUM_VARS, assigned_value};

/// Size of one variable slot in bytes.
const VAR_SIZE: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodegenOptions {
  /// Emit in-place `inc`/`dec` when `PRED`/`SUCC` target their own source,
  /// relying on `edx` being zeroed once at program start.
  pub optimize: bool,
  /// Precede each statement's code with a `; <statement>` comment.
  pub source_comments: bool,
}

impl Default for CodegenOptions {
  fn default() -> Self {
    Self {
      optimize: true,
      source_comments: false,
    }
  }
}

/// Emit assembly for a program.
pub fn generate(ast: &Ast, optimize: bool) -> String {
  generate_with(
    ast,
    CodegenOptions {
      optimize,
      source_comments: false,
    },
  )
}

/// Emit assembly for a program with explicit options.
pub fn generate_with(ast: &Ast, options: CodegenOptions) -> String {
  let mut asm = String::new();
  asm.push_str("format PE GUI\n");
  asm.push_str("entry start\n");
  asm.push('\n');
  asm.push_str("section '.text' code readable executable\n");
  asm.push('\n');
  asm.push_str("start:\n");

  let mut emitter = Emitter {
    ast,
    options,
    label_counter: 0,
    overflows: false,
    asm: &mut asm,
  };
  emitter.emit_node(ast.root());
  let overflows = emitter.overflows;

  if overflows {
    asm.push_str(OVERFLOW_EXIT);
  }
  asm.push_str(RUNTIME_PROCS);
  asm.push_str(IMPORT_SECTION);
  emit_data_section(&mut asm, overflows);
  asm.push_str("section '.reloc' fixups data readable discardable\n");
  asm.push_str("\n\n");

  debug!("generated {} bytes of assembly", asm.len());
  asm
}

fn offset(var: i64) -> i64 {
  var * VAR_SIZE
}

struct Emitter<'a> {
  ast: &'a Ast,
  options: CodegenOptions,
  label_counter: usize,
  /// Set once any statement jumps to the overflow exit.
  overflows: bool,
  asm: &'a mut String,
}

impl Emitter<'_> {
  fn next_label(&mut self) -> usize {
    let label = self.label_counter;
    self.label_counter += 1;
    label
  }

  fn comment(&mut self, text: impl FnOnce() -> String) {
    if self.options.source_comments {
      self.asm.push_str(&format!("; {}\n", text()));
    }
  }

  fn emit_children(&mut self, id: NodeId) {
    let ast = self.ast;
    for &child in ast.node(id).children() {
      self.emit_node(child);
    }
  }

  fn emit_node(&mut self, id: NodeId) {
    let ast = self.ast;
    let node = ast.node(id);
    match node.kind() {
      NodeKind::Program => {
        self.asm.push_str("  call InitInputBox\n");
        for &var in node.values() {
          self.asm.push_str(&format!("  push dword {var}\n"));
          self.asm.push_str("  call InputBox\n");
          self.asm.push_str(&format!("  mov ebx, _Vars+{}\n", offset(var)));
          self.asm.push_str("  mov [ebx], eax\n");
        }

        // The optimized PRED form stores edx as its zero.
        if self.options.optimize {
          self.asm.push_str("  xor edx, edx\n");
        }

        self.emit_children(id);
      }
      NodeKind::Assign => {
        let (var, value) = (node.value(0), node.value(1));
        self.comment(|| format!("X{var} := {value}"));

        self.asm.push_str(&format!("  mov ebx, _Vars+{}\n", offset(var)));
        match assigned_value(value) {
          Some(value) => self.asm.push_str(&format!("  mov [ebx], dword {value}\n")),
          None => {
            self.overflows = true;
            self.asm.push_str("  jmp overflow\n");
          }
        }
      }
      NodeKind::Pred => {
        let (target, source) = (node.value(0), node.value(1));
        self.comment(|| format!("X{target} := PRED(X{source})"));

        let label = self.next_label();
        if target == source && self.options.optimize {
          self.asm.push_str(&format!("  mov ebx, _Vars+{}\n", offset(target)));
          self.asm.push_str("  dec dword [ebx]\n");
          self.asm.push_str(&format!("  jns .__Var_Not_Negative_{label}__\n"));
          self.asm.push_str("  mov [ebx], edx\n");
          self.asm.push_str(&format!(".__Var_Not_Negative_{label}__:\n"));
        } else {
          self.asm.push_str(&format!("  mov ebx, _Vars+{}\n", offset(source)));
          self.asm.push_str("  mov eax, [ebx]\n");
          self.asm.push_str("  dec eax\n");
          self.asm.push_str(&format!("  jns .__Var_Not_Negative_{label}__\n"));
          self.asm.push_str("  xor eax, eax\n");
          self.asm.push_str(&format!(".__Var_Not_Negative_{label}__:\n"));
          self.asm.push_str(&format!("  mov ebx, _Vars+{}\n", offset(target)));
          self.asm.push_str("  mov [ebx], eax\n");
        }
      }
      NodeKind::Succ => {
        let (target, source) = (node.value(0), node.value(1));
        self.comment(|| format!("X{target} := SUCC(X{source})"));

        if target == source && self.options.optimize {
          self.asm.push_str(&format!("  mov ebx, _Vars+{}\n", offset(target)));
          self.asm.push_str("  inc dword [ebx]\n");
        } else {
          self.asm.push_str(&format!("  mov ebx, _Vars+{}\n", offset(source)));
          self.asm.push_str("  mov eax, [ebx]\n");
          self.asm.push_str("  inc eax\n");
          self.asm.push_str(&format!("  mov ebx, _Vars+{}\n", offset(target)));
          self.asm.push_str("  mov [ebx], eax\n");
        }
      }
      NodeKind::While => {
        let var = node.value(0);
        self.comment(|| format!("WHILE X{var} != 0 DO"));

        let label = self.next_label();
        self.asm.push_str(&format!("__While__{var}_{label}_Do:\n"));
        self.asm.push_str(&format!("  mov ebx, _Vars+{}\n", offset(var)));
        self.asm.push_str("  mov eax, [ebx]\n");
        self.asm.push_str("  test eax, eax\n");
        self.asm.push_str(&format!("  jz __While__{var}_{label}_End\n"));

        self.emit_children(id);

        self.asm.push_str(&format!("  jmp __While__{var}_{label}_Do\n"));
        self.asm.push_str(&format!("__While__{var}_{label}_End:\n"));
        self.comment(|| "END".to_string());
      }
      NodeKind::Result => {
        let var = node.value(0);
        self.comment(|| format!("RESULT (X{var})"));

        self.asm.push_str(&format!("  mov ebx, _Vars+{}\n", offset(var)));
        self.asm.push_str("  mov eax, [ebx]\n");
        self.asm.push_str("  push eax\n");
        self.asm.push_str("  push _szStrResultValue\n");
        self.asm.push_str("  call itoa\n");
        self.asm.push_str("  push 0\n");
        self.asm.push_str("  push _szStrResult\n");
        self.asm.push_str("  push _szStrResult\n");
        self.asm.push_str("  push 0\n");
        self.asm.push_str("  call[MessageBoxA]\n");
        self.asm.push_str("exit:\n");
        self.asm.push_str("  push 0\n");
        self.asm.push_str("  call[ExitProcess]\n");
      }
    }
  }
}

fn emit_data_section(asm: &mut String, overflows: bool) {
  asm.push_str("section '.data' data readable writeable\n");
  asm.push('\n');
  asm.push_str(&format!("  _Vars             rd {NUM_VARS}\n"));
  asm.push_str(DATA_STRINGS);
  if overflows {
    asm.push_str("  _szStrOverflow    db 'A variable overflowed.', 0\n");
  }
  asm.push_str("\n\n");
}

/// Shows the overflow message and exits with the interpreter's fault code.
const OVERFLOW_EXIT: &str = r"overflow:
  push 0
  push _szStrOverflow
  push _szStrOverflow
  push 0
  call[MessageBoxA]
  push -4
  call[ExitProcess]
";

/// `atoi`, `InitInputBox`, `InputBox`, `itoa` and the window callback.
const RUNTIME_PROCS: &str = r"atoi:
  pop eax
  pop ebx
  push eax
  mov ecx, ebx
.move_next:
  cmp byte [ecx], 0
  je .done
  inc ecx
  jmp .move_next
.done:
  dec ecx
  xor eax, eax
  inc eax
  xor edi, edi
.next_digit:
  xor edx, edx
  mov dl, [ecx]
  sub edx, '0'
  imul edx, eax
  add edi, edx
  imul eax, 10
  dec ecx
  cmp ecx, ebx
  jnb .next_digit
  mov eax, edi
  ret
InitInputBox:
  push ebp
  mov ebp, esp
  sub esp, 48 ; wcx
  mov [ebp-48], dword 48           ; cbSize
  mov [ebp-44], dword 2+1          ; style
  mov [ebp-40], dword WindowProc   ; lpfnWndProc
  mov [ebp-36], dword 0            ; cbClsExtra
  mov [ebp-32], dword 0            ; cbWndExtra
  mov [ebp-28], dword 0            ; hInstance
  mov [ebp-24], dword 0            ; hIcon
  mov [ebp-20], dword 0            ; hCursor
  mov [ebp-16], dword 5+1          ; hBrush
  mov [ebp-12], dword 0            ; lpszMenuName
  mov [ebp-8 ], dword _szClassName ; lpszClassName
  mov [ebp-4 ], dword 0            ; hIconSm
  push esp ; &wcx
  call [RegisterClassExA]
  mov esp, ebp
  pop ebp
  ret
InputBox:
  push ebp
  mov ebp, esp
  mov eax, [ebp+8]
  push eax
  push _szStaticTextInt
  call itoa
  sub esp, 4+28        ; hWnd, msg
  push dword 0         ; lpParam
  push dword 0         ; hInstance
  push dword 0         ; hMenu
  push dword 0         ; hWndParent
  push dword 70        ; nHeight
  push dword 160       ; nWidth
  push dword 80000000h ; y (CW_USEDEFAULT)
  push dword 80000000h ; x (CW_USEDEFAULT)
  push dword 80000h    ; dwStyle (WS_SYSMENU)
  push dword _szWindowName
  push dword _szClassName
  push dword 8h        ; dwExStyle (WS_EX_TOPMOST)
  call [CreateWindowExA]
  mov [ebp-4], eax     ; hWnd
  push dword 0         ; lpParam
  push dword 0         ; hInstance
  push dword 101       ; hMenu
  push dword [ebp-4]   ; hWndParent
  push dword 24        ; nHeight
  push dword 28        ; nWidth
  push dword 9         ; y
  push dword 6         ; x
  push dword 50000000h ; dwStyle
  push dword _szStaticText ; lpWindowName
  push dword _szStaticClass
  push dword 0h        ; dwExStyle
  call [CreateWindowExA]
  push dword 0         ; lpParam
  push dword 0         ; hInstance
  push dword 101       ; hMenu
  push dword [ebp-4]   ; hWndParent
  push dword 24        ; nHeight
  push dword 84        ; nWidth
  push dword 6         ; y
  push dword 34        ; x
  push dword 50000000h ; dwStyle
  push dword _szZero   ; lpWindowName
  push dword _szEditClass
  push dword 200h      ; dwExStyle (WS_EX_CLIENTEDGE)
  call [CreateWindowExA]
  mov [_hWndEdit], eax
  push 5 ; SW_SHOW
  push dword [ebp-4]
  call [ShowWindow]
  push dword [ebp-4]
  call [UpdateWindow]
.msg_loop:
  push 0 ; wMsgFilterMax
  push 0 ; wMsgFilterMin
  push 0 ; hWnd (NULL)
  mov eax, ebp
  sub eax, 32
  push eax  ; lpMsg
  call [GetMessageA]
  test eax, eax
  jle .done
  mov eax, ebp
  sub eax, 32
  push eax  ; lpMsg
  push eax  ; lpMsg
  call [TranslateMessage]
  call [DispatchMessageA]
  jmp .msg_loop
.done:
  push _szEditText
  call atoi
  mov esp, ebp
  pop ebp
  ret
itoa:
  pop ebx
  pop ecx
  pop eax
  push ebx
  push ecx
  mov ebx, 10
.next_digit:
  xor edx, edx
  div ebx
  add dl, '0'
  mov [ecx], dl
  inc ecx
  test eax, eax
  jnz .next_digit
  xor dl, dl
  mov [ecx], dl
  dec ecx
  pop ebx
.reverse:
  mov al, [ebx]
  mov ah, [ecx]
  mov [ebx], ah
  mov [ecx], al
  inc ebx
  dec ecx
  cmp ebx, ecx
  jb .reverse
  ret
WindowProc:
  push ebp
  mov ebp, esp
  mov eax, [ebp+12] ; msg
  cmp eax, 10h ; WM_CLOSE?
  jne .not_wm_close
  push 8
  push _szEditText
  push dword [_hWndEdit]
  call [GetWindowTextA]
  push dword [ebp+8] ; hwnd
  call [DestroyWindow]
  xor eax, eax
  jmp .done
.not_wm_close:
  cmp eax, 2h ; WM_DESTROY?
  jne .not_wm_destroy
  push 0
  call [PostQuitMessage]
  xor eax, eax
  jmp .done
.not_wm_destroy:
  push dword [ebp+20] ; lParam
  push dword [ebp+16] ; wParam
  push dword [ebp+12] ; msg
  push dword [ebp+8 ] ; hWNd
  call [DefWindowProcA]
.done:
  mov esp, ebp
  pop ebp
  ret
";

const IMPORT_SECTION: &str = r"section '.idata' import data readable writeable

  dd 0, 0, 0, RVA kernel_name, RVA kernel_table
  dd 0, 0, 0, RVA user_name, RVA user_table
  dd 0, 0, 0, 0, 0

kernel_table:
  ExitProcess dd RVA _ExitProcess
  GetLastError dd RVA _GetLastError
  dd 0

user_table:
  CreateWindowExA dd RVA _CreateWindowExA
  DefWindowProcA dd RVA _DefWindowProcA
  DestroyWindow dd RVA _DestroyWindow
  DispatchMessageA dd RVA _DispatchMessageA
  GetMessageA dd RVA _GetMessageA
  GetWindowTextA dd RVA _GetWindowTextA
  MessageBoxA dd RVA _MessageBoxA
  PostQuitMessage dd RVA _PostQuitMessage
  RegisterClassExA dd RVA _RegisterClassExA
  ShowWindow dd RVA _ShowWindow
  TranslateMessage dd RVA _TranslateMessage
  UpdateWindow dd RVA _UpdateWindow
  dd 0

  kernel_name db 'KERNEL32.DLL', 0
  user_name   db 'USER32.DLL', 0

  _ExitProcess dw 0
  db 'ExitProcess', 0
  _GetLastError dw 0
  db 'GetLastError', 0

  _CreateWindowExA dw 0
  db 'CreateWindowExA', 0
  _DefWindowProcA dw 0
  db 'DefWindowProcA', 0
  _DestroyWindow dw 0
  db 'DestroyWindow', 0
  _DispatchMessageA dw 0
  db 'DispatchMessageA', 0
  _GetMessageA dw 0
  db 'GetMessageA', 0
  _GetWindowTextA dw 0
  db 'GetWindowTextA', 0
  _MessageBoxA dw 0
  db 'MessageBoxA', 0
  _PostQuitMessage dw 0
  db 'PostQuitMessage', 0
  _RegisterClassExA dw 0
  db 'RegisterClassExA', 0
  _ShowWindow dw 0
  db 'ShowWindow', 0
  _TranslateMessage dw 0
  db 'TranslateMessage', 0
  _UpdateWindow dw 0
  db 'UpdateWindow', 0


";

const DATA_STRINGS: &str = r"  _szStrResult      db 'Result: '
  _szStrResultValue rb 64
  _hWndEdit dd 0
  _szWindowName db 'Input value', 0
  _szClassName db 'InputBoxClass', 0
  _szEditClass db 'EDIT', 0
  _szStaticClass db 'STATIC', 0
  _szZero db '0', 0
  _szEditText rb 8
  _szStaticText db 'X'
  _szStaticTextInt rb 8
";

#[cfg(test)]
mod tests {
  use super::*;

  /// Code between `start:` and the runtime procedures.
  fn body(asm: &str) -> &str {
    let start = asm.find("start:\n").unwrap() + "start:\n".len();
    let end = asm.find("atoi:\n").unwrap();
    &asm[start..end]
  }

  fn single(kind: NodeKind, values: Vec<i64>) -> Ast {
    let mut ast = Ast::new(vec![]);
    let root = ast.root();
    ast.push_child(root, kind, values);
    ast
  }

  #[test]
  fn in_place_pred_optimized() {
    let asm = generate(&single(NodeKind::Pred, vec![0, 0]), true);
    assert_eq!(
      body(&asm),
      "  call InitInputBox\n\
       \x20 xor edx, edx\n\
       \x20 mov ebx, _Vars+0\n\
       \x20 dec dword [ebx]\n\
       \x20 jns .__Var_Not_Negative_0__\n\
       \x20 mov [ebx], edx\n\
       .__Var_Not_Negative_0__:\n"
    );
  }

  #[test]
  fn in_place_pred_unoptimized() {
    let asm = generate(&single(NodeKind::Pred, vec![0, 0]), false);
    assert_eq!(
      body(&asm),
      "  call InitInputBox\n\
       \x20 mov ebx, _Vars+0\n\
       \x20 mov eax, [ebx]\n\
       \x20 dec eax\n\
       \x20 jns .__Var_Not_Negative_0__\n\
       \x20 xor eax, eax\n\
       .__Var_Not_Negative_0__:\n\
       \x20 mov ebx, _Vars+0\n\
       \x20 mov [ebx], eax\n"
    );
  }

  #[test]
  fn dependent_succ_loads_source_and_stores_target() {
    let asm = generate(&single(NodeKind::Succ, vec![3, 7]), true);
    assert_eq!(
      body(&asm),
      "  call InitInputBox\n\
       \x20 xor edx, edx\n\
       \x20 mov ebx, _Vars+28\n\
       \x20 mov eax, [ebx]\n\
       \x20 inc eax\n\
       \x20 mov ebx, _Vars+12\n\
       \x20 mov [ebx], eax\n"
    );

    let asm = generate(&single(NodeKind::Succ, vec![3, 3]), true);
    assert!(body(&asm).ends_with("  mov ebx, _Vars+12\n  inc dword [ebx]\n"));
  }

  #[test]
  fn inputs_are_read_in_declaration_order() {
    let ast = Ast::new(vec![2, 1]);
    let asm = generate(&ast, false);
    assert_eq!(
      body(&asm),
      "  call InitInputBox\n\
       \x20 push dword 2\n\
       \x20 call InputBox\n\
       \x20 mov ebx, _Vars+8\n\
       \x20 mov [ebx], eax\n\
       \x20 push dword 1\n\
       \x20 call InputBox\n\
       \x20 mov ebx, _Vars+4\n\
       \x20 mov [ebx], eax\n"
    );
  }

  #[test]
  fn assignment_stores_literal() {
    let asm = generate(&single(NodeKind::Assign, vec![10, 42]), false);
    assert!(body(&asm).ends_with("  mov ebx, _Vars+40\n  mov [ebx], dword 42\n"));
  }

  #[test]
  fn literal_too_large_for_a_variable_jumps_to_overflow() {
    let asm = generate(&single(NodeKind::Assign, vec![0, 99_999_999_999]), false);
    assert_eq!(
      body(&asm),
      "  call InitInputBox\n\
       \x20 mov ebx, _Vars+0\n\
       \x20 jmp overflow\n\
       overflow:\n\
       \x20 push 0\n\
       \x20 push _szStrOverflow\n\
       \x20 push _szStrOverflow\n\
       \x20 push 0\n\
       \x20 call[MessageBoxA]\n\
       \x20 push -4\n\
       \x20 call[ExitProcess]\n"
    );
    assert!(asm.contains("  _szStrOverflow    db 'A variable overflowed.', 0\n"));
    assert!(!asm.contains("dword 99999999999"));

    let asm = generate(&single(NodeKind::Assign, vec![0, 3_000_000_000]), false);
    assert!(body(&asm).contains("  jmp overflow\n"));
  }

  #[test]
  fn largest_literal_is_stored_and_needs_no_overflow_exit() {
    let asm = generate(&single(NodeKind::Assign, vec![0, i64::from(i32::MAX)]), false);
    assert!(body(&asm).ends_with("  mov ebx, _Vars+0\n  mov [ebx], dword 2147483647\n"));
    assert!(!asm.contains("overflow"));

    let asm = generate(&single(NodeKind::Assign, vec![0, -5]), false);
    assert!(body(&asm).ends_with("  mov [ebx], dword 0\n"));
  }

  #[test]
  fn nested_loops_get_unique_labels() {
    let mut ast = Ast::new(vec![1]);
    let root = ast.root();
    let outer = ast.push_child(root, NodeKind::While, vec![1]);
    let inner = ast.push_child(outer, NodeKind::While, vec![2]);
    ast.push_child(inner, NodeKind::Pred, vec![2, 2]);
    ast.push_child(outer, NodeKind::Pred, vec![1, 1]);

    let asm = generate(&ast, true);
    let code = body(&asm);
    for label in [
      "__While__1_0_Do:\n",
      "__While__2_1_Do:\n",
      ".__Var_Not_Negative_2__:\n",
      "  jmp __While__2_1_Do\n__While__2_1_End:\n",
      ".__Var_Not_Negative_3__:\n",
      "  jmp __While__1_0_Do\n__While__1_0_End:\n",
    ] {
      assert!(code.contains(label), "missing {label:?} in\n{code}");
    }
    assert!(code.find("__While__2_1_End:").unwrap() < code.find(".__Var_Not_Negative_3__:").unwrap());
  }

  #[test]
  fn loop_header_tests_the_variable() {
    let asm = generate(&single(NodeKind::While, vec![5]), false);
    assert_eq!(
      body(&asm),
      "  call InitInputBox\n\
       __While__5_0_Do:\n\
       \x20 mov ebx, _Vars+20\n\
       \x20 mov eax, [ebx]\n\
       \x20 test eax, eax\n\
       \x20 jz __While__5_0_End\n\
       \x20 jmp __While__5_0_Do\n\
       __While__5_0_End:\n"
    );
  }

  #[test]
  fn result_shows_message_box_and_exits() {
    let asm = generate(&single(NodeKind::Result, vec![1]), false);
    assert_eq!(
      body(&asm),
      "  call InitInputBox\n\
       \x20 mov ebx, _Vars+4\n\
       \x20 mov eax, [ebx]\n\
       \x20 push eax\n\
       \x20 push _szStrResultValue\n\
       \x20 call itoa\n\
       \x20 push 0\n\
       \x20 push _szStrResult\n\
       \x20 push _szStrResult\n\
       \x20 push 0\n\
       \x20 call[MessageBoxA]\n\
       exit:\n\
       \x20 push 0\n\
       \x20 call[ExitProcess]\n"
    );
  }

  #[test]
  fn source_comments_precede_statements() {
    let mut ast = Ast::new(vec![0]);
    let root = ast.root();
    let looped = ast.push_child(root, NodeKind::While, vec![0]);
    ast.push_child(looped, NodeKind::Pred, vec![0, 0]);
    ast.push_child(root, NodeKind::Result, vec![0]);

    let asm = generate_with(
      &ast,
      CodegenOptions {
        optimize: true,
        source_comments: true,
      },
    );
    let code = body(&asm);
    let comments: Vec<_> = code.lines().filter(|line| line.starts_with(';')).collect();
    assert_eq!(
      comments,
      vec!["; WHILE X0 != 0 DO", "; X0 := PRED(X0)", "; END", "; RESULT (X0)"]
    );
    assert!(!generate(&ast, true).contains("; END"));
  }

  #[test]
  fn fixed_sections_frame_the_program() {
    let asm = generate(&Ast::new(vec![]), true);
    assert!(asm.starts_with(
      "format PE GUI\nentry start\n\nsection '.text' code readable executable\n\nstart:\n"
    ));

    let procs = asm.find("atoi:\n").unwrap();
    let idata = asm.find("section '.idata' import data readable writeable\n").unwrap();
    let data = asm.find("section '.data' data readable writeable\n").unwrap();
    let reloc = asm.find("section '.reloc' fixups data readable discardable\n").unwrap();
    assert!(procs < idata && idata < data && data < reloc);

    assert!(asm.contains("  _Vars             rd 1000\n  _szStrResult      db 'Result: '\n"));
    assert!(asm.ends_with("section '.reloc' fixups data readable discardable\n\n\n"));
  }
}
