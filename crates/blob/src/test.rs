use crate::*;

fn function(name: u32, address: u32) -> Symbol {
  Symbol {
    name,
    kind: SymbolKind::Function,
    binding: Binding::Global,
    address,
    locals: 1,
    signature: 0,
  }
}

mod blob {
  use super::*;

  #[test]
  fn header_is_written() {
    let blob = Blob::new("main");
    let bytes = blob.as_bytes();

    assert_eq!(&bytes[0..4], b"AXOL");
    assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), VERSION);
    assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), 20);
    assert_eq!(blob.section_count(), 1);
    assert_eq!(blob.module_name(), "main");
  }

  #[test]
  fn strings_are_interned() {
    let mut blob = Blob::new("main");

    let hello = blob.add_string("hello");
    let world = blob.add_string("world");
    assert_ne!(hello, world);
    assert_eq!(blob.add_string("hello"), hello);
    assert_eq!(blob.add_string("world"), world);

    assert_eq!(blob.find_string("hello"), Some(hello));
    assert_eq!(blob.find_string("missing"), None);
    assert_eq!(blob.find_string("hell"), None);
    assert_eq!(blob.find_string(""), Some(0));

    assert_eq!(blob.string_at(hello), Some("hello"));
    assert_eq!(blob.string_at(world), Some("world"));
    assert_eq!(blob.string_at(hello + 1), Some("ello"));
    assert_eq!(blob.string_at(10_000), None);
  }

  #[test]
  fn symbols_are_not_deduplicated() {
    let mut blob = Blob::new("main");
    let name = blob.add_string("f");

    let first = blob.add_symbol(function(name, 0));
    let second = blob.add_symbol(function(name, 0));
    assert_eq!((first, second), (0, 1));
    assert_eq!(blob.symbol_count(), 2);
    assert_eq!(blob.symbol_at(1), Some(function(name, 0)));
    assert_eq!(blob.symbol_at(2), None);
    assert_eq!(blob.find_symbol("f").map(|(index, _)| index), Some(0));
    assert_eq!(blob.find_symbol("g"), None);
  }

  #[test]
  fn constants_are_deduplicated() {
    let mut blob = Blob::new("main");

    let one = blob.add_constant("int", "1");
    let two = blob.add_constant("int", "2");
    let string_one = blob.add_constant("string", "1");
    assert_eq!((one, two, string_one), (0, 1, 2));
    assert_eq!(blob.add_constant("int", "1"), one);
    assert_eq!(blob.constant_count(), 3);

    let constant = blob.constant_at(string_one).unwrap();
    assert_eq!(blob.string_at(constant.class), Some("string"));
    assert_eq!(blob.string_at(constant.value), Some("1"));
    assert_eq!(blob.constant_at(3), None);
  }

  #[test]
  fn variable_length_records() {
    let mut blob = Blob::new("main");

    assert_eq!(blob.add_type_spec("Point", &[0, 1, 2]), 0);
    assert_eq!(blob.add_type_spec("Empty", &[]), 1);
    assert_eq!(blob.add_type_spec("Point", &[3]), 2);
    assert_eq!(blob.type_spec_count(), 3);

    let empty = blob.type_spec_at(1).unwrap();
    assert_eq!(blob.string_at(empty.name), Some("Empty"));
    assert!(empty.symbols.is_empty());
    assert_eq!(blob.type_spec_at(2).unwrap().symbols, vec![3]);
    assert_eq!(blob.type_spec_at(3), None);

    assert_eq!(blob.add_signature(&[1, 2]), 0);
    assert_eq!(blob.add_signature(&[]), 1);
    assert_eq!(blob.add_signature(&[u64::MAX]), 2);
    assert_eq!(blob.signature_count(), 3);
    assert_eq!(blob.signature_at(0), Some(vec![1, 2]));
    assert_eq!(blob.signature_at(1), Some(vec![]));
    assert_eq!(blob.signature_at(2), Some(vec![u64::MAX]));
    assert_eq!(blob.signature_at(3), None);
  }

  #[test]
  fn growing_a_section_keeps_others_intact() {
    let mut blob = Blob::new("main");

    blob.append_text(&[1, 2, 3]);
    let f = blob.add_string("f");
    blob.add_symbol(function(f, 7));
    blob.add_signature(&[10, 20]);
    blob.add_type_spec("A", &[0]);
    blob.add_constant("int", "42");

    // grow every section again, in a different order
    blob.add_constant("float", "1.5");
    blob.add_type_spec("B", &[0, 0]);
    blob.add_signature(&[30]);
    let g = blob.add_string("g");
    blob.add_symbol(function(g, 9));
    blob.append_text(&[4, 5]);
    blob.add_debug_entry(DebugEntry {
      line: 1,
      col: 2,
      extent: 3,
    });
    blob.add_string("a string added at the very end");

    assert_eq!(blob.text(), vec![1, 2, 3, 4, 5]);
    assert_eq!(blob.symbol_at(0), Some(function(f, 7)));
    assert_eq!(blob.symbol_at(1), Some(function(g, 9)));
    assert_eq!(blob.signature_at(0), Some(vec![10, 20]));
    assert_eq!(blob.signature_at(1), Some(vec![30]));
    assert_eq!(blob.type_spec_at(1).unwrap().symbols, vec![0, 0]);
    assert_eq!(blob.string_at(blob.constant_at(1).unwrap().value), Some("1.5"));
    assert_eq!(blob.debug_entry_at(0).unwrap().extent, 3);
    assert_eq!(blob.module_name(), "main");

    let mut sections = blob.sections().collect::<Vec<_>>();
    sections.sort_by_key(|section| section.offset);
    for pair in sections.windows(2) {
      assert!(pair[0].offset + pair[0].size <= pair[1].offset);
    }
    let last = sections.last().unwrap();
    assert_eq!((last.offset + last.size) as usize, blob.as_bytes().len());
  }

  #[test]
  fn debug_entries() {
    let mut blob = Blob::new("main");
    assert_eq!(blob.debug_file(), None);
    assert_eq!(blob.debug_entry_count(), 0);

    blob.set_debug_file("main.ax");
    let entry = DebugEntry {
      line: 4,
      col: 1,
      extent: 10,
    };
    assert_eq!(blob.add_debug_entry(entry), 0);
    assert_eq!(blob.add_debug_entry(DebugEntry::default()), 1);

    assert_eq!(blob.debug_file(), Some("main.ax"));
    assert_eq!(blob.debug_entry_count(), 2);
    assert_eq!(blob.debug_entry_at(0), Some(entry));
    assert_eq!(blob.debug_entry_at(2), None);
  }

  #[test]
  fn load_from_bytes() {
    let mut blob = Blob::new("module");
    blob.add_constant("int", "5");
    blob.append_text(&[0, 1]);

    let loaded = Blob::from_bytes(blob.as_bytes().to_vec()).unwrap();
    assert_eq!(loaded, blob);
    assert_eq!(loaded.module_name(), "module");
    assert_eq!(loaded.text(), vec![0, 1]);
  }

  #[test]
  fn malformed_bytes() {
    assert_eq!(Blob::from_bytes(vec![0; 4]), Err(BlobError::TooShort(4)));

    let blob = Blob::new("m");
    let mut bytes = blob.as_bytes().to_vec();
    bytes[0] = b'X';
    assert!(matches!(Blob::from_bytes(bytes), Err(BlobError::BadMagic(_))));

    let mut bytes = blob.as_bytes().to_vec();
    bytes[4] = 9;
    assert!(matches!(Blob::from_bytes(bytes), Err(BlobError::BadVersion(_))));

    let mut bytes = blob.as_bytes().to_vec();
    bytes[12] = 200;
    assert_eq!(Blob::from_bytes(bytes), Err(BlobError::TableOutOfBounds));

    let mut bytes = blob.as_bytes().to_vec();
    bytes[28] = 255; // size of the strings section
    assert_eq!(
      Blob::from_bytes(bytes),
      Err(BlobError::SectionOutOfBounds(SectionKind::Strings))
    );
  }

  #[test]
  fn copies_are_independent() {
    let mut blob = Blob::new("m");
    let copy = blob.clone();
    blob.add_string("only in the original");

    assert!(copy.find_string("only in the original").is_none());
    assert!(blob.find_string("only in the original").is_some());
  }
}

mod assembler {
  use super::*;

  #[test]
  fn labels_resolve_to_absolute_positions() {
    let mut assembler = Assembler::new(Blob::new("main"));

    assembler.emit(OpCode::Jmp, &[Operand::label("end")], None).unwrap();
    assembler.label("loop");
    assembler.emit(OpCode::Nop, &[], None).unwrap();
    assembler.emit(OpCode::JmpIfTrue, &[Operand::label("loop")], None).unwrap();
    assembler.label("end");
    assembler.emit(OpCode::Leave, &[], None).unwrap();

    assert_eq!(assembler.label_position("loop"), Some(2));
    assert_eq!(assembler.label_position("end"), Some(5));

    let blob = assembler.into_blob().unwrap();
    assert_eq!(blob.text(), vec![
      OpCode::Jmp as u32,
      5,
      OpCode::Nop as u32,
      OpCode::JmpIfTrue as u32,
      2,
      OpCode::Leave as u32,
    ]);
  }

  #[test]
  fn strings_are_interned_as_operands() {
    let mut assembler = Assembler::new(Blob::new("main"));
    assembler.emit(OpCode::LoadGlobal, &[Operand::string("x")], None).unwrap();
    assembler.emit(OpCode::StorGlobal, &[Operand::string("x")], None).unwrap();

    let blob = assembler.into_blob().unwrap();
    let x = blob.find_string("x").unwrap();
    assert_eq!(blob.text(), vec![OpCode::LoadGlobal as u32, x, OpCode::StorGlobal as u32, x]);
  }

  #[test]
  fn operand_count_is_checked() {
    let mut assembler = Assembler::new(Blob::new("main"));

    let error = assembler.emit(OpCode::Pop, &[Operand::Index(1)], None);
    assert_eq!(
      error,
      Err(AssemblerError::Arity {
        opcode: OpCode::Pop,
        expected: 0,
        got: 1
      })
    );

    let error = assembler.emit(OpCode::Method, &[Operand::string("f")], None);
    assert!(matches!(error, Err(AssemblerError::Arity { .. })));
    assert_eq!(assembler.position(), 0);
  }

  #[test]
  fn undefined_label() {
    let mut assembler = Assembler::new(Blob::new("main"));
    assembler.emit(OpCode::Jmp, &[Operand::label("nowhere")], None).unwrap();

    let error = assembler.finalize();
    assert_eq!(error, Err(AssemblerError::UnresolvedLabel("nowhere".into())));
  }

  #[test]
  fn finalize_after_defining_missing_labels() {
    let mut assembler = Assembler::new(Blob::new("main"));
    assembler.emit(OpCode::Jmp, &[Operand::label("a")], None).unwrap();
    assembler.emit(OpCode::Jmp, &[Operand::label("b")], None).unwrap();
    assembler.emit(OpCode::Nop, &[], None).unwrap();

    let error = assembler.finalize();
    assert_eq!(error, Err(AssemblerError::UnresolvedLabel("a".into())));
    assert_eq!(assembler.blob().text_len(), 0);

    assembler.label("a");
    assembler.label("b");
    assembler.finalize().unwrap();
    assert_eq!(assembler.blob().text(), vec![
      OpCode::Jmp as u32,
      5,
      OpCode::Jmp as u32,
      5,
      OpCode::Nop as u32,
    ]);
  }

  #[test]
  fn debug_entries_follow_opcode() {
    let mut assembler = Assembler::new(Blob::new("main"));
    let entry = DebugEntry {
      line: 3,
      col: 5,
      extent: 2,
    };
    assembler.emit(OpCode::Invoke, &[Operand::Index(2)], Some(entry)).unwrap();

    let blob = assembler.into_blob().unwrap();
    assert_eq!(blob.text(), vec![OpCode::Invoke as u32 | DEBUG_MASK, 0, 2]);
    assert_eq!(blob.debug_entry_at(0), Some(entry));
    assert_eq!(decode(blob.text()[0]), Ok((OpCode::Invoke, true)));
  }

  #[test]
  fn finalize_twice_does_nothing() {
    let mut assembler = Assembler::new(Blob::new("main"));
    assembler.emit(OpCode::Nop, &[], None).unwrap();
    assembler.finalize().unwrap();
    assembler.finalize().unwrap();
    assert_eq!(assembler.blob().text(), vec![OpCode::Nop as u32]);

    assembler.label("after");
    assembler.emit(OpCode::Jmp, &[Operand::label("after")], None).unwrap();
    assembler.finalize().unwrap();
    assert_eq!(assembler.blob().text(), vec![OpCode::Nop as u32, OpCode::Jmp as u32, 1]);
  }
}

mod disassembler {
  use super::*;

  #[test]
  fn jump_targets_match_labels() {
    let mut assembler = Assembler::new(Blob::new("main"));
    let debug = Some(DebugEntry::default());

    assembler.label("start");
    assembler.emit(OpCode::LoadConst, &[Operand::signed(-1)], debug).unwrap();
    assembler.emit(OpCode::JmpIfFalse, &[Operand::label("else")], None).unwrap();
    assembler.emit(OpCode::Jmp, &[Operand::label("start")], debug).unwrap();
    assembler.label("else");
    assembler.emit(OpCode::Jmpr, &[Operand::signed(-3)], None).unwrap();
    assembler.emit(OpCode::Return, &[], None).unwrap();

    let labels = ["start", "else"].map(|label| assembler.label_position(label).unwrap());
    let blob = assembler.into_blob().unwrap();
    let instructions = Disassembler::new(&blob).instructions().unwrap();

    let opcodes = instructions.iter().map(|i| i.opcode).collect::<Vec<_>>();
    assert_eq!(opcodes, [
      OpCode::LoadConst,
      OpCode::JmpIfFalse,
      OpCode::Jmp,
      OpCode::Jmpr,
      OpCode::Return
    ]);

    assert_eq!(instructions[1].jump_target(), Some(labels[1]));
    assert_eq!(instructions[2].jump_target(), Some(labels[0]));
    assert_eq!(instructions[3].jump_target(), Some(labels[1] - 3));
    assert_eq!(instructions[0].debug, Some(0));
    assert_eq!(instructions[2].debug, Some(1));
  }

  #[test]
  fn invalid_opcode() {
    let mut blob = Blob::new("main");
    blob.append_text(&[OpCode::Nop as u32, 999]);

    let error = Disassembler::new(&blob).instructions();
    assert_eq!(
      error,
      Err(DisassemblyError::InvalidOpcode {
        address: 1,
        word: 999
      })
    );
  }

  #[test]
  fn truncated_instruction() {
    let mut blob = Blob::new("main");
    blob.append_text(&[OpCode::Method as u32, 0]);

    let error = Disassembler::new(&blob).instructions();
    assert_eq!(error, Err(DisassemblyError::Truncated(0)));
  }

  #[test]
  fn display() {
    let mut assembler = Assembler::new(Blob::new("main"));
    assembler.emit(OpCode::LoadGlobal, &[Operand::string("x")], None).unwrap();
    assembler.emit(OpCode::LoadConst, &[Operand::signed(-2)], None).unwrap();
    assembler.emit(OpCode::Return, &[], None).unwrap();
    let blob = assembler.into_blob().unwrap();

    let text = Disassembler::new(&blob).to_string();
    assert!(text.contains("0000 │ LOAD_GLOBAL 'x'"));
    assert!(text.contains("0002 │ LOAD_CONST arg1"));
    assert!(text.contains("0004 │ RETURN"));
  }
}

mod opcodes {
  use super::*;

  #[test]
  fn table_is_consistent() {
    for opcode in OpCode::ALL {
      assert_eq!(OpCode::try_from(*opcode as u32), Ok(*opcode));
      assert_eq!(OpCode::from_mnemonic(opcode.mnemonic()), Some(*opcode));
    }

    assert_eq!(OpCode::Method.arity(), 2);
    assert_eq!(OpCode::ImportMask.arity(), 2);
    assert_eq!(OpCode::Return.arity(), 0);
    assert!(OpCode::JmprIfTrue.is_jump());
    assert!(!OpCode::Invoke.is_jump());
    assert_eq!(decode(12345), Err(12345));
  }
}
