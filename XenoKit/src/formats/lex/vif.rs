//! VIF command stream interpreter
//!
//! Mesh data is stored as the command stream the PS2 vector interface would
//! have consumed. Only the subset used by LEX files is understood: UNPACK
//! blocks fill an arena of up to [`MAX_SLOTS`] slots which a FLUSH hands to
//! the mesh decoder as one batch.

use std::io::{ErrorKind, Read, Seek};

use byteorder::{LittleEndian, ReadBytesExt};

use super::material::MaterialBlock;
use crate::diagnostics::{Anomaly, Diagnostics};
use crate::error::{Error, Result};

/// Slots one batch may hold.
pub const MAX_SLOTS: usize = 8;

/// Size of the block header preceding UNPACKs to address 0.
pub const BLOCK_HEADER_SIZE: usize = 16;

/// Block kind announcing an inline material descriptor.
pub const BLOCK_KIND_MATERIAL: u8 = 0x40;

/// A decoded 4-byte VIF command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VifCommand {
    pub imm: u16,
    pub num: u8,
    pub cmd: u8,
}

impl VifCommand {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            imm: u16::from_le_bytes([bytes[0], bytes[1]]),
            num: bytes[2],
            cmd: bytes[3],
        }
    }

    /// Destination address of an UNPACK.
    #[must_use]
    pub fn addr(&self) -> u16 {
        self.imm & 0x3FF
    }

    #[must_use]
    pub fn tops_add(&self) -> bool {
        self.imm & 0x8000 != 0
    }

    #[must_use]
    pub fn opcode(&self) -> Opcode {
        match self.cmd {
            0x00 => Opcode::Nop,
            0x01 => Opcode::Stcycl,
            0x17 => Opcode::Flush,
            0x20 => Opcode::Stmask,
            0x60..=0x7F => Opcode::Unpack(UnpackFormat::from_cmd(self.cmd)),
            other => Opcode::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Nop,
    Stcycl,
    Flush,
    Stmask,
    Unpack(UnpackFormat),
    Unknown(u8),
}

/// Element layout of an UNPACK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpackFormat {
    pub components: usize,
    /// Bytes per component; 0 for the unsupported packed layout.
    pub component_bytes: usize,
    pub masked: bool,
}

impl UnpackFormat {
    #[must_use]
    pub fn from_cmd(cmd: u8) -> Self {
        Self {
            components: usize::from((cmd & 0xC) >> 2) + 1,
            component_bytes: [4, 2, 1, 0][usize::from(cmd & 0x3)],
            masked: cmd & 0x10 != 0,
        }
    }

    /// Unpadded payload length for `num` elements.
    #[must_use]
    pub fn data_len(&self, num: usize) -> usize {
        num * self.components * self.component_bytes
    }

    /// Payload length as stored, padded to a 4-byte boundary.
    #[must_use]
    pub fn payload_len(&self, num: usize) -> usize {
        self.data_len(num).next_multiple_of(4)
    }
}

/// Header preceding an UNPACK to address 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub count: u8,
    pub format: u8,
    pub kind: u8,
}

impl BlockHeader {
    #[must_use]
    pub fn from_bytes(bytes: &[u8; BLOCK_HEADER_SIZE]) -> Self {
        Self {
            count: bytes[0],
            format: bytes[4],
            kind: bytes[5],
        }
    }
}

/// One UNPACK's worth of data.
#[derive(Debug, Clone)]
pub struct Slot {
    pub count: usize,
    pub components: usize,
    pub component_bytes: usize,
    data: Vec<u8>,
}

impl Slot {
    #[must_use]
    pub fn new(count: usize, format: UnpackFormat, data: Vec<u8>) -> Self {
        Self {
            count,
            components: format.components,
            component_bytes: format.component_bytes,
            data,
        }
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Little-endian 32-bit word at `index` (in words).
    #[must_use]
    pub fn word(&self, index: usize) -> Option<u32> {
        let start = index.checked_mul(4)?;
        let bytes = self.data.get(start..start.checked_add(4)?)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    #[must_use]
    pub fn float(&self, index: usize) -> Option<f32> {
        self.word(index).map(f32::from_bits)
    }

    #[must_use]
    pub fn byte(&self, index: usize) -> Option<u8> {
        self.data.get(index).copied()
    }
}

/// Fixed-capacity store for the slots of the current batch.
#[derive(Debug, Clone, Default)]
pub struct SlotArena {
    slots: Vec<Slot>,
}

impl SlotArena {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(MAX_SLOTS),
        }
    }

    pub fn push(&mut self, slot: Slot, offset: u64) -> Result<()> {
        if self.slots.len() >= MAX_SLOTS {
            return Err(Error::SlotOverflow {
                offset,
                max: MAX_SLOTS,
            });
        }
        self.slots.push(slot);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn take(&mut self) -> SlotArena {
        SlotArena {
            slots: std::mem::replace(&mut self.slots, Vec::with_capacity(MAX_SLOTS)),
        }
    }
}

/// A flushed set of slots plus the vertex count from the latest block header.
#[derive(Debug, Clone)]
pub struct Batch {
    pub count: usize,
    pub format: u8,
    pub slots: SlotArena,
}

/// What the caller must do after one interpreter step.
#[derive(Debug)]
pub enum VifEvent {
    /// Nothing visible happened.
    Continue,
    /// A batch is ready for vertex reconstruction.
    Batch(Batch),
    /// The active material changes.
    Material(MaterialBlock),
    /// The mesh's command range is exhausted.
    End,
}

/// Interpreter state for one mesh.
#[derive(Debug)]
pub struct VifInterpreter {
    end: u64,
    arena: SlotArena,
    header: Option<BlockHeader>,
    cycle: (u8, u8),
    mask: u32,
}

impl VifInterpreter {
    /// Interpret commands up to the absolute stream offset `end`.
    #[must_use]
    pub fn new(end: u64) -> Self {
        Self {
            end,
            arena: SlotArena::new(),
            header: None,
            cycle: (0, 0),
            mask: 0,
        }
    }

    /// Slots buffered since the last flush.
    #[must_use]
    pub fn pending_slots(&self) -> usize {
        self.arena.len()
    }

    /// Read and execute one command.
    pub fn step<R: Read + Seek>(
        &mut self,
        reader: &mut R,
        diag: &mut Diagnostics,
    ) -> Result<VifEvent> {
        let offset = reader.stream_position()?;
        if offset == self.end {
            return Ok(VifEvent::End);
        }

        let mut bytes = [0u8; 4];
        match reader.read_exact(&mut bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(VifEvent::End),
            Err(e) => return Err(e.into()),
        }
        let command = VifCommand::from_bytes(bytes);
        tracing::trace!(
            "vif 0x{offset:08x}: cmd=0x{:02x} num={} imm=0x{:04x}",
            command.cmd,
            command.num,
            command.imm
        );

        match command.opcode() {
            Opcode::Nop => Ok(VifEvent::Continue),
            Opcode::Stcycl => {
                let [cl, wl] = command.imm.to_le_bytes();
                self.cycle = (cl, wl);
                Ok(VifEvent::Continue)
            }
            Opcode::Stmask => {
                self.mask = reader.read_u32::<LittleEndian>()?;
                Ok(VifEvent::Continue)
            }
            Opcode::Flush => Ok(self.flush(offset)?.map_or(VifEvent::Continue, VifEvent::Batch)),
            Opcode::Unpack(format) => self.unpack(reader, command, format, offset, diag),
            Opcode::Unknown(opcode) => Err(Error::UnknownOpcode { opcode, offset }),
        }
    }

    fn flush(&mut self, offset: u64) -> Result<Option<Batch>> {
        if self.arena.is_empty() {
            return Ok(None);
        }
        let header = self.header.ok_or_else(|| {
            Error::batch(format!("flush at 0x{offset:08x} without a block header"))
        })?;
        let slots = self.arena.take();
        tracing::trace!(
            "flush 0x{offset:08x}: {} slots, {} vertices, cycle {:?}",
            slots.len(),
            header.count,
            self.cycle
        );
        Ok(Some(Batch {
            count: usize::from(header.count),
            format: header.format,
            slots,
        }))
    }

    fn unpack<R: Read + Seek>(
        &mut self,
        reader: &mut R,
        command: VifCommand,
        format: UnpackFormat,
        offset: u64,
        diag: &mut Diagnostics,
    ) -> Result<VifEvent> {
        let invalid = |reason: &'static str| Error::InvalidUnpack {
            opcode: command.cmd,
            offset,
            reason,
        };

        if format.component_bytes == 0 {
            return Err(invalid("packed 5-bit layout is not supported"));
        }
        if !command.tops_add() {
            return Err(invalid("destination is not relative to TOPS"));
        }
        if format.masked {
            diag.report(Anomaly::UnmaskedWrite {
                offset,
                mask: self.mask,
            });
        }

        let mut num = usize::from(command.num);
        if command.addr() == 0 {
            let mut raw = [0u8; BLOCK_HEADER_SIZE];
            reader.read_exact(&mut raw)?;
            let header = BlockHeader::from_bytes(&raw);
            self.header = Some(header);
            num = num
                .checked_sub(1)
                .ok_or_else(|| invalid("block header without an element"))?;

            match header.kind {
                0 => {}
                BLOCK_KIND_MATERIAL => {
                    let payload_offset = reader.stream_position()?;
                    let mut payload = vec![0u8; format.data_len(num)];
                    reader.read_exact(&mut payload)?;
                    let block = MaterialBlock::parse(&payload).ok_or(
                        Error::UnknownMaterialBlock {
                            length: payload.len(),
                            offset: payload_offset,
                        },
                    )?;
                    return Ok(VifEvent::Material(block));
                }
                kind => return Err(Error::UnknownBlockKind { kind, offset }),
            }
        }

        let mut data = vec![0u8; format.payload_len(num)];
        reader.read_exact(&mut data)?;
        self.arena.push(Slot::new(num, format, data), offset)?;
        Ok(VifEvent::Continue)
    }
}
